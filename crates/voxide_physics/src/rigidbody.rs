//! # Rigidbody Simulation
//!
//! Discrete, axis-separated swept-AABB movement against static world
//! geometry.
//!
//! ## Per Tick, Per Body
//!
//! ```text
//! 1. reject invalid elapsed              (no state change)
//! 2. remove Grounded
//! 3. v += g·dt
//! 4. v *= exp(-drag·dt)                  (drag > 0 only)
//! 5. d = v·dt
//! 6. for axis in [Y, X, Z]:
//!        skip if d[axis] == 0
//!        sweep every collider along the axis, query the geometry
//!        the most restrictive candidate bounds the move:
//!            move by the shortest allowed distance, v[axis] = 0
//!            downward Y  ──> Grounded
//!        otherwise move the full distance
//! ```
//!
//! The position advances per axis, so X is resolved from the settled Y
//! position and Z from both. Broken geometry (non-finite boxes) is ignored.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use voxide_core::{
    CapabilityKey, Elapsed, SharedRegistry, Subscription, System, SystemBuilder, TickReport,
    TickSource, TraitResult,
};

use crate::aabb::Aabb;
use crate::components::{Colliders, Gravity, Grounded, Position, Velocity};
use crate::geometry::WorldGeometry;
use crate::units::{Axis, Length, Quantity, Speed, Vec3};

/// Body state after one [`step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    /// New position.
    pub position: Vec3<Length>,
    /// New velocity.
    pub velocity: Vec3<Speed>,
    /// A downward move was stopped by geometry.
    pub grounded: bool,
}

/// Advances one body by `elapsed`.
///
/// Returns `None` if `elapsed` is negative or not finite.
#[must_use]
pub fn step(
    position: Vec3<Length>,
    velocity: Vec3<Speed>,
    gravity: &Gravity,
    colliders: &[Aabb],
    geometry: &dyn WorldGeometry,
    elapsed: Elapsed,
) -> Option<StepOutcome> {
    if !elapsed.is_valid() {
        return None;
    }

    let mut position = position;
    let mut velocity = velocity;

    velocity += gravity.acceleration() * elapsed;
    if gravity.drag() > 0.0 {
        velocity = velocity * (-gravity.drag() * elapsed.as_secs_f64()).exp();
    }
    let displacement: Vec3<Length> = velocity * elapsed;

    let mut grounded = false;
    for axis in Axis::RESOLUTION_ORDER {
        let requested = displacement.get(axis);
        if requested == Length::ZERO {
            continue;
        }
        match shortened_travel(position, axis, requested, colliders, geometry) {
            Some(travel) => {
                *position.get_mut(axis) += travel;
                *velocity.get_mut(axis) = Speed::ZERO;
                if axis == Axis::Y && requested < Length::ZERO {
                    grounded = true;
                }
            }
            None => *position.get_mut(axis) += requested,
        }
    }

    Some(StepOutcome {
        position,
        velocity,
        grounded,
    })
}

/// Shortest travel allowed along `axis` by any candidate overlapping any
/// collider's sweep, or `None` if nothing blocks the full move.
fn shortened_travel(
    position: Vec3<Length>,
    axis: Axis,
    requested: Length,
    colliders: &[Aabb],
    geometry: &dyn WorldGeometry,
) -> Option<Length> {
    let wanted = requested.si();
    let mut allowed = wanted;
    for local in colliders {
        let moving = local.translate(position);
        if !moving.is_finite() {
            continue;
        }
        let swept = moving.sweep(axis, requested);

        for candidate in geometry.collisions(&swept) {
            if !candidate.is_finite() || !candidate.intersects(&swept) {
                continue;
            }
            let travel = if wanted > 0.0 {
                let gap = candidate.min_on(axis) - moving.max_on(axis);
                if gap <= 0.0 {
                    0.0
                } else {
                    gap.min(wanted)
                }
            } else {
                let gap = candidate.max_on(axis) - moving.min_on(axis);
                if gap >= 0.0 {
                    0.0
                } else {
                    gap.max(wanted)
                }
            };
            if travel.abs() < allowed.abs() {
                allowed = travel;
            }
        }
    }
    (allowed.abs() < wanted.abs()).then(|| Length::from_si(allowed))
}

/// Moves every body holding [`Position`], [`Velocity`] and [`Gravity`]
/// through the world geometry, once per tick.
///
/// Bodies without [`Colliders`] fall freely.
pub struct RigidbodySimulation {
    system: System,
}

impl RigidbodySimulation {
    /// Builds the simulation over `registry`.
    #[must_use]
    pub fn new(registry: &SharedRegistry, geometry: Arc<dyn WorldGeometry>) -> Self {
        let mut builder = SystemBuilder::new(registry);
        let position = builder.write(&CapabilityKey::<Position>::identity());
        let velocity = builder.write(&CapabilityKey::<Velocity>::identity());
        let gravity = builder.read(&CapabilityKey::<Gravity>::identity());

        builder.body(move |body, elapsed| {
            body.remove::<Grounded>()?;
            let colliders = body
                .with(|colliders: &Colliders| colliders.0.clone())?
                .unwrap_or_default();
            let pull = *gravity.get()?;
            let start = position.get()?.0;
            let moving = velocity.get()?.0;

            let Some(outcome) = step(start, moving, &pull, &colliders, geometry.as_ref(), elapsed)
            else {
                return Ok(());
            };
            position.update(|p| p.0 = outcome.position)?;
            velocity.update(|v| v.0 = outcome.velocity)?;
            if outcome.grounded {
                body.add(Grounded)?;
            }
            Ok(())
        });

        Self {
            system: builder.build(),
        }
    }

    /// Advances every body by `elapsed`.
    ///
    /// # Errors
    ///
    /// Propagates registry errors raised while a body is updated, wrapped in
    /// [`voxide_core::TraitError::Handler`].
    pub fn tick(&mut self, elapsed: Elapsed) -> TraitResult<TickReport> {
        self.system.tick(elapsed)
    }

    /// Drives `simulation` from `source`. Errors are logged.
    pub fn subscribe(simulation: &Rc<RefCell<Self>>, source: &dyn TickSource) -> Subscription {
        let simulation = Rc::downgrade(simulation);
        source.subscribe(Box::new(move |elapsed| {
            let Some(simulation) = simulation.upgrade() else {
                return;
            };
            let Ok(mut simulation) = simulation.try_borrow_mut() else {
                return;
            };
            if let Err(error) = simulation.tick(elapsed) {
                tracing::error!(%error, "rigidbody tick failed");
            }
        }))
    }
}

impl fmt::Debug for RigidbodySimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigidbodySimulation")
            .field("system", &self.system)
            .finish()
    }
}
