//! # Systems
//!
//! A system runs one body per matching entity per tick.
//!
//! ```text
//! let mut builder = SystemBuilder::new(&registry);
//! let counter = builder.read(&CapabilityKey::<Counter>::identity());
//! builder.body(move |entity, elapsed| { ... counter.get()? ... });
//! let mut system = builder.build();
//!
//! system.tick(elapsed)
//!   ├─ elapsed invalid      ──> TickReport { rejected: true, .. }
//!   ├─ query(required tags) ──> entities in slot order
//!   └─ per entity: enter ─> body ─> guard dropped
//! ```
//!
//! A body error stops the tick after that entity's bindings are cleared.
//! Work committed for earlier entities in the same tick is kept.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::binding::{Read, Resolver, Write};
use crate::capability::{CapabilityKey, CapabilityTag};
use crate::entity::EntityId;
use crate::error::{HandlerError, TraitError, TraitResult};
use crate::handle::EntityHandle;
use crate::registry::{Registry, SharedRegistry};
use crate::tick::{Subscription, TickSource};
use crate::time::Elapsed;

/// Per-entity system logic.
pub type SystemBody = Box<dyn FnMut(&EntityHandle, Elapsed) -> Result<(), HandlerError>>;

/// Outcome of one [`System::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The elapsed duration was negative or non-finite; nothing ran.
    pub rejected: bool,
    /// Entities returned by the query.
    pub matched: usize,
    /// Entities whose body ran to completion.
    pub processed: usize,
    /// Matched entities skipped because a binding could not resolve.
    pub filtered: usize,
}

impl TickReport {
    fn rejected() -> Self {
        Self {
            rejected: true,
            ..Self::default()
        }
    }
}

fn this_entity(id: &EntityId) -> EntityId {
    *id
}

/// Declares the bindings and body of a [`System`].
pub struct SystemBuilder {
    resolver: Resolver<EntityId>,
    body: Option<SystemBody>,
}

impl SystemBuilder {
    /// Starts a system over `registry`.
    #[must_use]
    pub fn new(registry: &SharedRegistry) -> Self {
        Self {
            resolver: Resolver::new(registry),
            body: None,
        }
    }

    /// Declares a read binding and adds its type to the required set.
    pub fn read<W: 'static, R: 'static>(&mut self, key: &CapabilityKey<W, R>) -> Read<W, R> {
        self.resolver.declare_read(this_entity, key)
    }

    /// Declares a write binding and adds its type to the required set.
    pub fn write<W: 'static, R: 'static>(&mut self, key: &CapabilityKey<W, R>) -> Write<W> {
        self.resolver.declare_write(this_entity, key)
    }

    /// Sets the per-entity body, replacing any previous one.
    pub fn body<F>(&mut self, body: F) -> &mut Self
    where
        F: FnMut(&EntityHandle, Elapsed) -> Result<(), HandlerError> + 'static,
    {
        self.body = Some(Box::new(body));
        self
    }

    /// Capability types an entity must hold to be visited.
    #[must_use]
    pub fn required(&self) -> Vec<CapabilityTag> {
        self.resolver.required()
    }

    /// Finishes the declaration phase.
    #[must_use]
    pub fn build(self) -> System {
        let required = self.resolver.required();
        System {
            resolver: self.resolver,
            body: self.body,
            required,
        }
    }
}

impl fmt::Debug for SystemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemBuilder")
            .field("required", &self.resolver.required())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A built system, driven by [`System::tick`] or a [`TickSource`].
pub struct System {
    resolver: Resolver<EntityId>,
    body: Option<SystemBody>,
    required: Vec<CapabilityTag>,
}

impl System {
    /// Runs the body once for every entity holding all required types.
    ///
    /// # Errors
    ///
    /// - [`TraitError::Handler`] if the body fails; remaining entities are
    ///   not visited
    /// - [`TraitError::Busy`] if the registry is borrowed when the tick starts
    ///   or when an entity's bindings are resolved
    pub fn tick(&mut self, elapsed: Elapsed) -> TraitResult<TickReport> {
        if !elapsed.is_valid() {
            return Ok(TickReport::rejected());
        }
        let Some(body) = self.body.as_mut() else {
            return Ok(TickReport::default());
        };

        let entities = self
            .resolver
            .registry()
            .try_borrow()
            .map_err(|_| TraitError::Busy {
                capability: type_name::<Registry>(),
            })?
            .query(&self.required);

        let mut report = TickReport {
            matched: entities.len(),
            ..TickReport::default()
        };

        for entity in entities {
            let Some(guard) = self.resolver.enter(&entity)? else {
                report.filtered += 1;
                continue;
            };
            let handle = EntityHandle::new(Rc::clone(self.resolver.registry()), entity);
            let outcome = body(&handle, elapsed);
            drop(guard);

            outcome.map_err(|source| TraitError::Handler { entity, source })?;
            report.processed += 1;
        }

        Ok(report)
    }

    /// Capability types an entity must hold to be visited.
    #[must_use]
    pub fn required(&self) -> &[CapabilityTag] {
        &self.required
    }

    /// Returns `true` if a body was defined.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Drives `system` from `source`.
    ///
    /// Tick errors are logged and do not close the subscription. The source
    /// holds only a weak reference: dropping the last `Rc` stops delivery.
    pub fn subscribe(system: &Rc<RefCell<Self>>, source: &dyn TickSource) -> Subscription {
        let system = Rc::downgrade(system);
        source.subscribe(Box::new(move |elapsed| {
            let Some(system) = system.upgrade() else {
                return;
            };
            let Ok(mut system) = system.try_borrow_mut() else {
                return;
            };
            if let Err(error) = system.tick(elapsed) {
                tracing::error!(%error, "system tick failed");
            }
        }))
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("required", &self.required)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::TickBus;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter(u32);

    #[test]
    fn test_no_body_is_noop() {
        let registry = Registry::new().shared();
        let id = registry.borrow_mut().create();
        registry.borrow_mut().add(id, Counter(1)).unwrap();

        let mut builder = SystemBuilder::new(&registry);
        let _counter = builder.read(&CapabilityKey::<Counter>::identity());
        let mut system = builder.build();

        assert!(!system.has_body());
        assert_eq!(system.tick(Elapsed::from_secs_f64(1.0)).unwrap(), TickReport::default());
    }

    #[test]
    fn test_body_sees_elapsed_and_handle() {
        let registry = Registry::new().shared();
        let id = registry.borrow_mut().create();
        registry.borrow_mut().add(id, Counter(1)).unwrap();

        let mut builder = SystemBuilder::new(&registry);
        let counter = builder.write(&CapabilityKey::<Counter>::identity());
        builder.body(move |entity, elapsed| {
            counter.update(|c| c.0 += 1)?;
            entity.add(elapsed.as_secs_f64())?;
            Ok(())
        });
        let mut system = builder.build();

        let report = system.tick(Elapsed::from_secs_f64(0.5)).unwrap();
        assert_eq!(report.processed, 1);

        let registry = registry.borrow();
        assert_eq!(registry.get::<Counter>(id).unwrap(), Some(&Counter(2)));
        assert_eq!(registry.get::<f64>(id).unwrap(), Some(&0.5));
    }

    #[test]
    fn test_subscription_drives_ticks() {
        let registry = Registry::new().shared();
        let id = registry.borrow_mut().create();
        registry.borrow_mut().add(id, Counter(0)).unwrap();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let mut builder = SystemBuilder::new(&registry);
        let _counter = builder.read(&CapabilityKey::<Counter>::identity());
        builder.body(move |_, _| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        let system = Rc::new(RefCell::new(builder.build()));

        let bus = TickBus::new();
        let mut subscription = System::subscribe(&system, &bus);
        bus.advance(Elapsed::from_millis(50.0));
        bus.advance(Elapsed::from_millis(-1.0));
        assert_eq!(calls.get(), 1);

        subscription.close();
        bus.advance(Elapsed::from_millis(50.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_busy_registry_fails_tick() {
        let registry = Registry::new().shared();
        let mut builder = SystemBuilder::new(&registry);
        builder.body(|_, _| Ok(()));
        let mut system = builder.build();

        let held = registry.borrow_mut();
        assert!(matches!(
            system.tick(Elapsed::ZERO),
            Err(TraitError::Busy { .. })
        ));
        drop(held);
        assert!(system.tick(Elapsed::ZERO).is_ok());
    }
}
