//! # Entity Handle
//!
//! A lifecycle-checked façade over one identity inside a shared registry.
//! Handlers receive one for the entity they run on.

use std::any::type_name;
use std::cell::{Ref, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::entity::EntityId;
use crate::error::{TraitError, TraitResult};
use crate::registry::{Registry, SharedRegistry};

/// Handle to one entity in a [`SharedRegistry`].
///
/// Every call re-checks that the entity is alive. Calls borrow the registry
/// for their own duration only, so a handle is safe to use inside system
/// bodies and event handlers. A call made while a binding accessor guard is
/// held fails with [`TraitError::Busy`] instead of panicking.
#[derive(Clone)]
pub struct EntityHandle {
    registry: SharedRegistry,
    id: EntityId,
}

impl EntityHandle {
    /// Creates a handle for `id` in `registry`.
    #[must_use]
    pub fn new(registry: SharedRegistry, id: EntityId) -> Self {
        Self { registry, id }
    }

    /// Creates a new entity in `registry` and returns its handle.
    ///
    /// # Errors
    ///
    /// [`TraitError::Busy`] if the registry is already borrowed.
    pub fn spawn(registry: &SharedRegistry) -> TraitResult<Self> {
        let id = registry.try_borrow_mut().map_err(|_| busy())?.create();
        Ok(Self::new(Rc::clone(registry), id))
    }

    /// Returns the wrapped identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the registry this handle points into.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Checks if the entity is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.read().is_ok_and(|registry| registry.is_alive(self.id))
    }

    /// Adds a capability, replacing and returning any previous one.
    ///
    /// # Errors
    ///
    /// Lifecycle error if the entity is destroyed.
    pub fn add<T: 'static>(&self, capability: T) -> TraitResult<Option<T>> {
        self.write()?.add(self.id, capability)
    }

    /// Returns a clone of the capability of type `T`, if present.
    ///
    /// # Errors
    ///
    /// Lifecycle error if the entity is destroyed.
    pub fn get<T: Clone + 'static>(&self) -> TraitResult<Option<T>> {
        self.with(T::clone)
    }

    /// Borrows the capability of type `T` and maps it through `f`.
    ///
    /// # Errors
    ///
    /// Lifecycle error if the entity is destroyed.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> TraitResult<Option<R>> {
        Ok(self.read()?.get::<T>(self.id)?.map(f))
    }

    /// Removes and returns the capability of type `T`, if present.
    ///
    /// # Errors
    ///
    /// Lifecycle error if the entity is destroyed.
    pub fn remove<T: 'static>(&self) -> TraitResult<Option<T>> {
        self.write()?.remove::<T>(self.id)
    }

    /// Checks whether the entity holds a capability of type `T`.
    ///
    /// # Errors
    ///
    /// Lifecycle error if the entity is destroyed.
    pub fn has<T: 'static>(&self) -> TraitResult<bool> {
        self.read()?.has::<T>(self.id)
    }

    /// Destroys the entity.
    ///
    /// # Errors
    ///
    /// Lifecycle error if the entity is already destroyed.
    pub fn destroy(&self) -> TraitResult<()> {
        self.write()?.destroy(self.id)
    }

    /// Runs `f` with exclusive access to the registry.
    ///
    /// # Errors
    ///
    /// [`TraitError::Busy`] if the registry is already borrowed.
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut Registry, EntityId) -> R) -> TraitResult<R> {
        let mut registry = self.write()?;
        Ok(f(&mut *registry, self.id))
    }

    fn read(&self) -> TraitResult<Ref<'_, Registry>> {
        self.registry.try_borrow().map_err(|_| busy())
    }

    fn write(&self) -> TraitResult<RefMut<'_, Registry>> {
        self.registry.try_borrow_mut().map_err(|_| busy())
    }
}

fn busy() -> TraitError {
    TraitError::Busy {
        capability: type_name::<Registry>(),
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityHandle").field(&self.id).finish()
    }
}
