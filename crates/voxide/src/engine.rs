//! # Engine
//!
//! One registry, one rigidbody simulation, one fixed-step clock:
//!
//! ```text
//! EngineConfig ──> spawn_body ──> Registry <──┐
//!                                             │ query / bind
//! frame time ──> FixedTimestep ──> TickBus ──> RigidbodySimulation
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use voxide_core::{Elapsed, EntityHandle, Registry, SharedRegistry, Subscription, TraitResult};
use voxide_physics::{Colliders, Gravity, Position, RigidbodySimulation, Velocity, WorldGeometry};

use crate::config::{BodyConfig, ConfigError, ConfigResult, EngineConfig};
use crate::game_loop::{FixedTimestep, FrameStats};

/// Creates a rigid body in `registry` from its configuration.
///
/// Bodies without their own gravity get `default_gravity`. An empty
/// collider list adds no [`Colliders`], so the body falls freely.
///
/// # Errors
///
/// [`voxide_core::TraitError::Busy`] if the registry is already borrowed
/// elsewhere.
pub fn spawn_body(
    registry: &SharedRegistry,
    body: &BodyConfig,
    default_gravity: Gravity,
) -> TraitResult<EntityHandle> {
    let handle = EntityHandle::spawn(registry)?;
    handle.add(Position(body.position))?;
    handle.add(Velocity(body.velocity))?;
    handle.add(body.gravity.unwrap_or(default_gravity))?;
    if !body.colliders.is_empty() {
        handle.add(Colliders(body.colliders.clone()))?;
    }
    Ok(handle)
}

/// A running world.
pub struct Engine {
    registry: SharedRegistry,
    clock: FixedTimestep,
    simulation: Rc<RefCell<RigidbodySimulation>>,
    bodies: Vec<EntityHandle>,
    subscription: Subscription,
}

impl Engine {
    /// Builds the world described by `config` over `geometry`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the configuration does not validate.
    pub fn new(config: &EngineConfig, geometry: Arc<dyn WorldGeometry>) -> ConfigResult<Self> {
        config.validate()?;
        let default_gravity = config.physics.gravity()?;

        let registry = Registry::new().shared();
        let bodies = config
            .bodies
            .iter()
            .map(|body| spawn_body(&registry, body, default_gravity))
            .collect::<TraitResult<Vec<_>>>()
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;

        let clock = FixedTimestep::new(&config.tick);
        let simulation = Rc::new(RefCell::new(RigidbodySimulation::new(&registry, geometry)));
        let subscription = RigidbodySimulation::subscribe(&simulation, clock.bus());

        tracing::info!(
            bodies = bodies.len(),
            step_secs = clock.step().as_secs_f64(),
            "engine ready"
        );

        Ok(Self {
            registry,
            clock,
            simulation,
            bodies,
            subscription,
        })
    }

    /// The capability registry.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Bodies spawned from the configuration, in order.
    #[must_use]
    pub fn bodies(&self) -> &[EntityHandle] {
        &self.bodies
    }

    /// Spawns another body at runtime.
    ///
    /// # Errors
    ///
    /// See [`spawn_body`].
    pub fn spawn(
        &mut self,
        body: &BodyConfig,
        default_gravity: Gravity,
    ) -> TraitResult<EntityHandle> {
        let handle = spawn_body(&self.registry, body, default_gravity)?;
        self.bodies.push(handle.clone());
        Ok(handle)
    }

    /// The fixed-step clock.
    #[must_use]
    pub fn clock(&self) -> &FixedTimestep {
        &self.clock
    }

    /// Feeds one frame of real time to the clock.
    pub fn frame(&mut self, frame: Elapsed) -> FrameStats {
        self.clock.advance(frame)
    }

    /// Runs exactly one simulation step, bypassing the clock.
    ///
    /// # Errors
    ///
    /// Propagates the simulation's tick error.
    pub fn step_once(&mut self) -> TraitResult<()> {
        self.simulation.borrow_mut().tick(self.clock.step())?;
        Ok(())
    }

    /// Stops the clock from driving the simulation.
    pub fn pause(&mut self) {
        self.subscription.close();
    }

    /// Whether the clock still drives the simulation.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.subscription.is_closed()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("bodies", &self.bodies.len())
            .field("clock", &self.clock)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxide_physics::{Aabb, Length, StaticGeometry, Vec3};

    fn body(y: f64) -> BodyConfig {
        BodyConfig {
            position: Vec3::from_si([0.0, y, 0.0]),
            velocity: Vec3::ZERO,
            colliders: Vec::new(),
            gravity: None,
        }
    }

    #[test]
    fn test_spawn_uses_default_gravity_and_skips_empty_colliders() {
        let registry = Registry::new().shared();
        let handle = spawn_body(&registry, &body(3.0), Gravity::none()).unwrap();

        assert_eq!(handle.get::<Gravity>().unwrap(), Some(Gravity::none()));
        assert!(!handle.has::<Colliders>().unwrap());
        assert_eq!(
            handle.get::<Position>().unwrap().map(|p| p.0),
            Some(Vec3::from_si([0.0, 3.0, 0.0]))
        );
    }

    #[test]
    fn test_spawn_keeps_body_gravity_and_colliders() {
        let registry = Registry::new().shared();
        let mut config = body(0.0);
        config.gravity = Some(Gravity::earth());
        config.colliders = vec![Aabb::footprint(Length::meters(1.0), Length::meters(1.0))];

        let handle = spawn_body(&registry, &config, Gravity::none()).unwrap();
        assert_eq!(handle.get::<Gravity>().unwrap(), Some(Gravity::earth()));
        assert_eq!(handle.get::<Colliders>().unwrap().map(|c| c.0.len()), Some(1));
    }

    #[test]
    fn test_spawn_into_borrowed_registry_is_busy() {
        let registry = Registry::new().shared();
        let held = registry.borrow_mut();
        let error = spawn_body(&registry, &body(0.0), Gravity::none()).unwrap_err();
        assert!(matches!(error, voxide_core::TraitError::Busy { .. }));
        drop(held);
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn test_pause_stops_the_clock_from_moving_bodies() {
        let mut config = EngineConfig::default();
        config.bodies.push(body(10.0));
        let mut engine = Engine::new(&config, Arc::new(StaticGeometry::default())).unwrap();
        let handle = engine.bodies()[0].clone();

        engine.frame(Elapsed::from_millis(60.0));
        let after_one = handle.get::<Position>().unwrap().map(|p| p.0.y.as_meters());
        assert!(after_one.is_some_and(|y| y < 10.0));

        engine.pause();
        assert!(!engine.is_running());
        engine.frame(Elapsed::from_millis(500.0));
        assert_eq!(
            handle.get::<Position>().unwrap().map(|p| p.0.y.as_meters()),
            after_one
        );
    }
}
