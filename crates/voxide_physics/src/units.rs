//! # Quantities
//!
//! Typed physical quantities in SI base units, plus a 3-component vector over
//! any of them. Multiplying by [`Elapsed`] moves one step down the chain:
//!
//! ```text
//! Acceleration × Elapsed ──> Speed
//! Speed        × Elapsed ──> Length
//! ```
//!
//! The rest of the crate treats these as opaque numbers with units.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use voxide_core::Elapsed;

/// A scalar quantity backed by an `f64` in SI base units.
pub trait Quantity: Copy + PartialOrd + fmt::Debug {
    /// Zero in this unit.
    const ZERO: Self;

    /// Wraps a raw SI value.
    fn from_si(value: f64) -> Self;

    /// Returns the raw SI value.
    fn si(self) -> f64;

    /// Returns `true` if the value is neither infinite nor NaN.
    #[inline]
    fn is_finite(self) -> bool {
        self.si().is_finite()
    }
}

macro_rules! quantity {
    ($(#[$doc:meta])* $name:ident, $suffix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(f64);

        impl Quantity for $name {
            const ZERO: Self = Self(0.0);

            #[inline]
            fn from_si(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            fn si(self) -> f64 {
                self.0
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                Self(self.0 * rhs)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!("{}", $suffix), self.0)
            }
        }
    };
}

quantity!(
    /// Distance in meters.
    Length,
    " m"
);
quantity!(
    /// Speed in meters per second.
    Speed,
    " m/s"
);
quantity!(
    /// Acceleration in meters per second squared.
    Acceleration,
    " m/s²"
);

impl Length {
    /// Creates a length in meters.
    #[inline]
    #[must_use]
    pub const fn meters(value: f64) -> Self {
        Self(value)
    }

    /// Creates a length in centimeters.
    #[inline]
    #[must_use]
    pub fn centimeters(value: f64) -> Self {
        Self(value / 100.0)
    }

    /// Returns the length in meters.
    #[inline]
    #[must_use]
    pub const fn as_meters(self) -> f64 {
        self.0
    }
}

impl Speed {
    /// Creates a speed in meters per second.
    #[inline]
    #[must_use]
    pub const fn meters_per_second(value: f64) -> Self {
        Self(value)
    }

    /// Creates a speed in kilometers per hour.
    #[inline]
    #[must_use]
    pub fn kilometers_per_hour(value: f64) -> Self {
        Self(value / 3.6)
    }

    /// Returns the speed in meters per second.
    #[inline]
    #[must_use]
    pub const fn as_meters_per_second(self) -> f64 {
        self.0
    }
}

impl Acceleration {
    /// Magnitude of standard gravity at the Earth's surface.
    pub const STANDARD_GRAVITY: Self = Self(9.806_65);

    /// Creates an acceleration in meters per second squared.
    #[inline]
    #[must_use]
    pub const fn meters_per_second_squared(value: f64) -> Self {
        Self(value)
    }

    /// Returns the acceleration in meters per second squared.
    #[inline]
    #[must_use]
    pub const fn as_meters_per_second_squared(self) -> f64 {
        self.0
    }
}

impl Mul<Elapsed> for Speed {
    type Output = Length;
    #[inline]
    fn mul(self, rhs: Elapsed) -> Length {
        Length(self.0 * rhs.as_secs_f64())
    }
}

impl Mul<Elapsed> for Acceleration {
    type Output = Speed;
    #[inline]
    fn mul(self, rhs: Elapsed) -> Speed {
        Speed(self.0 * rhs.as_secs_f64())
    }
}

/// One of the three world axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// East-west.
    X,
    /// Up-down.
    Y,
    /// North-south.
    Z,
}

impl Axis {
    /// Order in which movement is resolved: vertical first.
    pub const RESOLUTION_ORDER: [Self; 3] = [Self::Y, Self::X, Self::Z];
}

/// A 3-component vector of one quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3<U> {
    /// X component.
    pub x: U,
    /// Y component (up).
    pub y: U,
    /// Z component.
    pub z: U,
}

impl<U: Quantity> Vec3<U> {
    /// The zero vector.
    pub const ZERO: Self = Self {
        x: U::ZERO,
        y: U::ZERO,
        z: U::ZERO,
    };

    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: U, y: U, z: U) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector from raw SI components.
    #[inline]
    #[must_use]
    pub fn from_si([x, y, z]: [f64; 3]) -> Self {
        Self::new(U::from_si(x), U::from_si(y), U::from_si(z))
    }

    /// Returns the raw SI components.
    #[inline]
    #[must_use]
    pub fn si(self) -> [f64; 3] {
        [self.x.si(), self.y.si(), self.z.si()]
    }

    /// Returns the component on `axis`.
    #[inline]
    #[must_use]
    pub fn get(self, axis: Axis) -> U {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns a mutable reference to the component on `axis`.
    #[inline]
    pub fn get_mut(&mut self, axis: Axis) -> &mut U {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Returns `true` if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Applies `f` to every component.
    #[inline]
    #[must_use]
    pub fn map<V: Quantity>(self, f: impl Fn(U) -> V) -> Vec3<V> {
        Vec3::new(f(self.x), f(self.y), f(self.z))
    }
}

impl<U: Quantity + Add<Output = U>> Add for Vec3<U> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<U: Quantity + AddAssign> AddAssign for Vec3<U> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl<U, V> Mul<Elapsed> for Vec3<U>
where
    U: Quantity + Mul<Elapsed, Output = V>,
    V: Quantity,
{
    type Output = Vec3<V>;
    #[inline]
    fn mul(self, rhs: Elapsed) -> Vec3<V> {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl<U: Quantity + Mul<f64, Output = U>> Mul<f64> for Vec3<U> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}
