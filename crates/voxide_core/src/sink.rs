//! # Event Sinks
//!
//! Binding resolution driven per event instead of per tick. Each binding
//! names a field of the event that yields the target entity:
//!
//! ```text
//! struct Damage { target: EntityId, amount: u32 }
//!
//! let mut builder = EventSinkBuilder::<Damage>::new(&registry);
//! let health = builder.write(|event| event.target, &CapabilityKey::<Health>::identity());
//! builder.handler(move |event| { health.update(|h| h.0 -= event.amount)?; Ok(()) });
//! let mut sink = builder.build();
//!
//! sink.put(Damage { .. })  ──> Delivery::Handled | Delivery::Dropped
//! ```

use std::fmt;

use crate::binding::{Read, Resolver, Target, Write};
use crate::capability::{CapabilityKey, CapabilityTag};
use crate::error::{HandlerError, TraitError, TraitResult};
use crate::registry::SharedRegistry;

/// What happened to an event handed to a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Every binding resolved and the handler ran.
    Handled,
    /// A binding could not resolve, or the sink has no handler.
    Dropped,
}

/// Receives events pushed by a source, in the source's delivery order.
pub trait EventSink<E> {
    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Implementation-defined; [`BoundSink`] reports handler failures.
    fn put(&mut self, event: E) -> TraitResult<Delivery>;
}

/// Event handler logic.
pub type EventHandler<E> = Box<dyn FnMut(&E) -> Result<(), HandlerError>>;

/// Declares the bindings and handler of a [`BoundSink`].
pub struct EventSinkBuilder<E: 'static> {
    resolver: Resolver<E>,
    handler: Option<EventHandler<E>>,
}

impl<E: 'static> EventSinkBuilder<E> {
    /// Starts a sink over `registry`.
    #[must_use]
    pub fn new(registry: &SharedRegistry) -> Self {
        Self {
            resolver: Resolver::new(registry),
            handler: None,
        }
    }

    /// Declares a read binding on the entity selected by `field`.
    pub fn read<W: 'static, R: 'static>(
        &mut self,
        field: Target<E>,
        key: &CapabilityKey<W, R>,
    ) -> Read<W, R> {
        self.resolver.declare_read(field, key)
    }

    /// Declares a write binding on the entity selected by `field`.
    pub fn write<W: 'static, R: 'static>(
        &mut self,
        field: Target<E>,
        key: &CapabilityKey<W, R>,
    ) -> Write<W> {
        self.resolver.declare_write(field, key)
    }

    /// Sets the handler, replacing any previous one.
    pub fn handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&E) -> Result<(), HandlerError> + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Capability types the bindings resolve.
    #[must_use]
    pub fn required(&self) -> Vec<CapabilityTag> {
        self.resolver.required()
    }

    /// Finishes the declaration phase.
    #[must_use]
    pub fn build(self) -> BoundSink<E> {
        BoundSink {
            resolver: self.resolver,
            handler: self.handler,
        }
    }
}

impl<E: 'static> fmt::Debug for EventSinkBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSinkBuilder")
            .field("required", &self.resolver.required())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// A built sink: resolves its bindings for each event, then runs the handler.
pub struct BoundSink<E: 'static> {
    resolver: Resolver<E>,
    handler: Option<EventHandler<E>>,
}

impl<E: 'static> BoundSink<E> {
    /// Returns `true` if a handler was defined.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl<E: 'static> EventSink<E> for BoundSink<E> {
    /// # Errors
    ///
    /// - [`TraitError::EventHandler`] if the handler fails; bindings are
    ///   cleared before the error is returned
    /// - [`TraitError::Busy`] if the registry is mutably borrowed
    fn put(&mut self, event: E) -> TraitResult<Delivery> {
        let Some(handler) = self.handler.as_mut() else {
            return Ok(Delivery::Dropped);
        };
        let Some(guard) = self.resolver.enter(&event)? else {
            return Ok(Delivery::Dropped);
        };
        let outcome = handler(&event);
        drop(guard);

        outcome.map_err(|source| TraitError::EventHandler { source })?;
        Ok(Delivery::Handled)
    }
}

impl<E: 'static> fmt::Debug for BoundSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSink")
            .field("required", &self.resolver.required())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::registry::Registry;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);

    struct Damage {
        target: EntityId,
        amount: i32,
    }

    #[test]
    fn test_handler_applies_event() {
        let registry = Registry::new().shared();
        let id = registry.borrow_mut().create();
        registry.borrow_mut().add(id, Health(10)).unwrap();

        let mut builder = EventSinkBuilder::<Damage>::new(&registry);
        let health = builder.write(|event| event.target, &CapabilityKey::<Health>::identity());
        builder.handler(move |event| {
            health.update(|h| h.0 -= event.amount)?;
            Ok(())
        });
        let mut sink = builder.build();

        let delivery = sink.put(Damage { target: id, amount: 3 }).unwrap();
        assert_eq!(delivery, Delivery::Handled);
        assert_eq!(registry.borrow().get::<Health>(id).unwrap(), Some(&Health(7)));
    }

    #[test]
    fn test_without_handler_drops() {
        let registry = Registry::new().shared();
        let id = registry.borrow_mut().create();
        registry.borrow_mut().add(id, Health(10)).unwrap();

        let mut builder = EventSinkBuilder::<Damage>::new(&registry);
        let _health = builder.read(|event| event.target, &CapabilityKey::<Health>::identity());
        let mut sink = builder.build();

        assert!(!sink.has_handler());
        assert_eq!(
            sink.put(Damage { target: id, amount: 1 }).unwrap(),
            Delivery::Dropped
        );
    }

    #[test]
    fn test_borrowed_registry_is_busy_not_dropped() {
        let registry = Registry::new().shared();
        let id = registry.borrow_mut().create();
        registry.borrow_mut().add(id, Health(10)).unwrap();

        let mut builder = EventSinkBuilder::<Damage>::new(&registry);
        let _health = builder.read(|event| event.target, &CapabilityKey::<Health>::identity());
        builder.handler(|_| Ok(()));
        let mut sink = builder.build();

        let held = registry.borrow_mut();
        assert!(matches!(
            sink.put(Damage { target: id, amount: 1 }),
            Err(TraitError::Busy { .. })
        ));
        drop(held);
        assert_eq!(
            sink.put(Damage { target: id, amount: 1 }).unwrap(),
            Delivery::Handled
        );
    }

    #[test]
    fn test_unresolved_event_is_dropped_silently() {
        let registry = Registry::new().shared();
        let bare = registry.borrow_mut().create();
        let gone = registry.borrow_mut().create();
        registry.borrow_mut().destroy(gone).unwrap();

        let mut builder = EventSinkBuilder::<Damage>::new(&registry);
        let _health = builder.read(|event| event.target, &CapabilityKey::<Health>::identity());
        builder.handler(|_| Err("must not run".into()));
        let mut sink = builder.build();

        for target in [bare, gone] {
            assert_eq!(
                sink.put(Damage { target, amount: 1 }).unwrap(),
                Delivery::Dropped
            );
        }
    }
}
