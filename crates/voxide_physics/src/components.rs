//! # Physics Capabilities
//!
//! Values a body carries in the registry:
//!
//! | Capability  | Payload                          | Required by the simulation |
//! |-------------|----------------------------------|----------------------------|
//! | `Position`  | world position (feet)            | yes                        |
//! | `Velocity`  | world velocity                   | yes                        |
//! | `Gravity`   | acceleration vector + drag       | yes                        |
//! | `Colliders` | local-space boxes                | no (no collision without)  |
//! | `Grounded`  | marker, set after landing        | written by the simulation  |

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::error::{PhysicsError, PhysicsResult};
use crate::units::{Acceleration, Length, Quantity, Speed, Vec3};

/// World position of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec3<Length>);

/// World velocity of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3<Speed>);

/// Local-space collision boxes, offset by the body's position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Colliders(pub Vec<Aabb>);

/// Marker: the body's last downward move was stopped by geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Grounded;

/// Gravity and drag acting on a body.
///
/// Both values are validated whenever they are set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Gravity {
    acceleration: Vec3<Acceleration>,
    drag: f64,
}

impl Gravity {
    /// Creates a gravity descriptor.
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::NonFiniteGravity`] if a component is infinite or NaN
    /// - [`PhysicsError::InvalidDrag`] if `drag` is negative or not finite
    pub fn new(acceleration: Vec3<Acceleration>, drag: f64) -> PhysicsResult<Self> {
        Ok(Self {
            acceleration: check_acceleration(acceleration)?,
            drag: check_drag(drag)?,
        })
    }

    /// Straight-down standard gravity with no drag.
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vec3::new(
                Acceleration::ZERO,
                -Acceleration::STANDARD_GRAVITY,
                Acceleration::ZERO,
            ),
            drag: 0.0,
        }
    }

    /// No acceleration and no drag.
    #[must_use]
    pub fn none() -> Self {
        Self {
            acceleration: Vec3::ZERO,
            drag: 0.0,
        }
    }

    /// Acceleration vector.
    #[inline]
    #[must_use]
    pub fn acceleration(&self) -> Vec3<Acceleration> {
        self.acceleration
    }

    /// Drag coefficient, per second.
    #[inline]
    #[must_use]
    pub fn drag(&self) -> f64 {
        self.drag
    }

    /// Replaces the acceleration vector.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::NonFiniteGravity`]; the old value is kept.
    pub fn set_acceleration(&mut self, acceleration: Vec3<Acceleration>) -> PhysicsResult<()> {
        self.acceleration = check_acceleration(acceleration)?;
        Ok(())
    }

    /// Replaces the drag coefficient.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidDrag`]; the old value is kept.
    pub fn set_drag(&mut self, drag: f64) -> PhysicsResult<()> {
        self.drag = check_drag(drag)?;
        Ok(())
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

#[derive(Deserialize)]
struct RawGravity {
    acceleration: Vec3<Acceleration>,
    #[serde(default)]
    drag: f64,
}

impl<'de> Deserialize<'de> for Gravity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawGravity::deserialize(deserializer)?;
        Self::new(raw.acceleration, raw.drag).map_err(serde::de::Error::custom)
    }
}

fn check_drag(drag: f64) -> PhysicsResult<f64> {
    if drag.is_finite() && drag >= 0.0 {
        Ok(drag)
    } else {
        Err(PhysicsError::InvalidDrag(drag))
    }
}

fn check_acceleration(acceleration: Vec3<Acceleration>) -> PhysicsResult<Vec3<Acceleration>> {
    if acceleration.is_finite() {
        Ok(acceleration)
    } else {
        Err(PhysicsError::NonFiniteGravity(acceleration.si()))
    }
}
