//! # Binding Resolver
//!
//! The per-iteration protocol shared by systems (one iteration per entity per
//! tick) and event sinks (one iteration per event).
//!
//! ## Two phases
//!
//! ```text
//! declare:   resolver.declare_read(target, &key)  ──> Read<W, R>   (inert)
//!            resolver.declare_write(target, &key) ──> Write<W>     (inert)
//!
//! iterate:   resolver.enter(&context)
//!              ├─ every binding resolves ──> Ok(Some(IterationGuard)), accessors live
//!              ├─ any binding missing    ──> Ok(None), nothing touched
//!              └─ registry mutably held  ──> Err(Busy)
//!            handler runs
//!            IterationGuard dropped       ──> every binding cleared
//! ```
//!
//! The guard clears bindings on every exit path, including unwinding out of a
//! panicking handler. Using an accessor while no iteration owns it is a
//! binding-scope error.
//!
//! Accessors borrow the shared registry for the lifetime of the returned
//! guard. Holding a [`Read`] guard while calling [`Write::get_mut`] on the
//! same registry yields [`TraitError::Busy`]; copy values out first.

use std::any::{type_name, Any};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::capability::{CapabilityKey, CapabilityTag, ErasedView};
use crate::entity::EntityId;
use crate::error::{TraitError, TraitResult};
use crate::registry::SharedRegistry;

/// Resolved state of one binding, valid for one iteration.
struct Resolved {
    entity: EntityId,
    /// Converted read view. `None` for identity reads and for writes.
    view: Option<Box<dyn Any>>,
}

type StateCell = Rc<RefCell<Option<Resolved>>>;

/// Selects the entity a binding resolves against from the iteration context.
pub type Target<C> = fn(&C) -> EntityId;

struct Binding<C> {
    tag: CapabilityTag,
    target: Target<C>,
    view: Option<ErasedView>,
    state: StateCell,
}

/// Declared bindings plus the registry they resolve against.
///
/// `C` is the iteration context: an [`EntityId`] for systems, the event type
/// for sinks.
pub(crate) struct Resolver<C> {
    registry: SharedRegistry,
    bindings: Vec<Binding<C>>,
}

impl<C> Resolver<C> {
    pub(crate) fn new(registry: &SharedRegistry) -> Self {
        Self {
            registry: Rc::clone(registry),
            bindings: Vec::new(),
        }
    }

    pub(crate) fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Declares a read binding. The key's conversion, if any, runs once per
    /// resolution.
    pub(crate) fn declare_read<W: 'static, R: 'static>(
        &mut self,
        target: Target<C>,
        key: &CapabilityKey<W, R>,
    ) -> Read<W, R> {
        let state = self.push(target, key.tag(), key.erased_view());
        Read {
            registry: Rc::clone(&self.registry),
            state,
            _marker: PhantomData,
        }
    }

    /// Declares a write binding on the key's writable type.
    pub(crate) fn declare_write<W: 'static, R: 'static>(
        &mut self,
        target: Target<C>,
        key: &CapabilityKey<W, R>,
    ) -> Write<W> {
        let state = self.push(target, key.tag(), None);
        Write {
            registry: Rc::clone(&self.registry),
            state,
            _marker: PhantomData,
        }
    }

    /// Distinct capability tags required by the declared bindings.
    pub(crate) fn required(&self) -> Vec<CapabilityTag> {
        let mut tags: Vec<CapabilityTag> = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if !tags.contains(&binding.tag) {
                tags.push(binding.tag);
            }
        }
        tags
    }

    /// Resolves every binding for `context`.
    ///
    /// Returns `Ok(None)` without touching any binding if one of them cannot
    /// be resolved: the target is not alive or lacks the capability.
    ///
    /// # Errors
    ///
    /// [`TraitError::Busy`] if the registry is mutably borrowed.
    pub(crate) fn enter(&self, context: &C) -> TraitResult<Option<IterationGuard<'_, C>>> {
        let registry = self
            .registry
            .try_borrow()
            .map_err(|_| busy::<crate::registry::Registry>())?;

        let mut resolved = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            let entity = (binding.target)(context);
            let Some(value) = registry.get_any(entity, binding.tag).ok().flatten() else {
                return Ok(None);
            };
            let view = match &binding.view {
                Some(convert) => match convert(value) {
                    Some(view) => Some(view),
                    None => return Ok(None),
                },
                None => None,
            };
            resolved.push(Resolved { entity, view });
        }
        drop(registry);

        for (binding, state) in self.bindings.iter().zip(resolved) {
            *binding.state.borrow_mut() = Some(state);
        }
        Ok(Some(IterationGuard {
            bindings: &self.bindings,
        }))
    }

    fn push(
        &mut self,
        target: Target<C>,
        tag: CapabilityTag,
        view: Option<ErasedView>,
    ) -> StateCell {
        let state: StateCell = Rc::new(RefCell::new(None));
        self.bindings.push(Binding {
            tag,
            target,
            view,
            state: Rc::clone(&state),
        });
        state
    }
}

/// Keeps the bindings of one iteration live. Dropping it clears them.
pub(crate) struct IterationGuard<'a, C> {
    bindings: &'a [Binding<C>],
}

impl<C> Drop for IterationGuard<'_, C> {
    fn drop(&mut self) {
        for binding in self.bindings {
            if let Ok(mut state) = binding.state.try_borrow_mut() {
                *state = None;
            }
        }
    }
}

/// Read accessor for a declared binding.
///
/// Exposes only the key's read view: the stored instance for identity keys,
/// the converted value otherwise.
pub struct Read<W: 'static, R: 'static = W> {
    registry: SharedRegistry,
    state: StateCell,
    _marker: PhantomData<fn() -> (W, R)>,
}

impl<W: 'static, R: 'static> Read<W, R> {
    /// Returns the read view for the current iteration.
    ///
    /// # Errors
    ///
    /// - [`TraitError::OutOfScope`] outside an active iteration
    /// - [`TraitError::Busy`] if the capability is mutably borrowed
    /// - [`TraitError::Vanished`] if the handler removed the capability
    /// - a lifecycle error if the handler destroyed the entity
    pub fn get(&self) -> TraitResult<Ref<'_, R>> {
        let state = self.state.borrow();
        let Some(resolved) = state.as_ref() else {
            return Err(out_of_scope::<W>());
        };
        if resolved.view.is_none() {
            // Identity keys are only constructible with R == W.
            let entity = resolved.entity;
            drop(state);
            return stored::<R>(&self.registry, entity);
        }
        Ref::filter_map(state, |state| {
            state
                .as_ref()
                .and_then(|resolved| resolved.view.as_ref())
                .and_then(|view| view.downcast_ref::<R>())
        })
        .map_err(|_| out_of_scope::<W>())
    }

    /// Returns the entity this binding resolved to.
    ///
    /// # Errors
    ///
    /// [`TraitError::OutOfScope`] outside an active iteration.
    pub fn entity(&self) -> TraitResult<EntityId> {
        entity_of::<W>(&self.state)
    }

    /// Returns `true` while an iteration owns this binding.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state.borrow().is_some()
    }
}

impl<W: 'static, R: 'static> fmt::Debug for Read<W, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Read")
            .field("capability", &type_name::<W>())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Write accessor for a declared binding.
///
/// Exposes the stored capability directly. [`Write::set`] replaces the
/// stored value with a new instance, the same as [`Registry::add`].
///
/// [`Registry::add`]: crate::Registry::add
pub struct Write<W: 'static> {
    registry: SharedRegistry,
    state: StateCell,
    _marker: PhantomData<fn() -> W>,
}

impl<W: 'static> Write<W> {
    /// Borrows the stored capability.
    ///
    /// # Errors
    ///
    /// Same as [`Read::get`].
    pub fn get(&self) -> TraitResult<Ref<'_, W>> {
        let entity = entity_of::<W>(&self.state)?;
        stored::<W>(&self.registry, entity)
    }

    /// Mutably borrows the stored capability.
    ///
    /// # Errors
    ///
    /// Same as [`Read::get`].
    pub fn get_mut(&self) -> TraitResult<RefMut<'_, W>> {
        let entity = entity_of::<W>(&self.state)?;
        let registry = self.registry.try_borrow_mut().map_err(|_| busy::<W>())?;
        if registry.get::<W>(entity)?.is_none() {
            return Err(vanished::<W>(entity));
        }
        RefMut::filter_map(registry, |registry| registry.get_mut::<W>(entity).ok().flatten())
            .map_err(|_| vanished::<W>(entity))
    }

    /// Replaces the stored capability, returning the previous instance.
    ///
    /// # Errors
    ///
    /// - [`TraitError::OutOfScope`] outside an active iteration
    /// - [`TraitError::Busy`] if the capability is borrowed
    /// - a lifecycle error if the handler destroyed the entity
    pub fn set(&self, value: W) -> TraitResult<Option<W>> {
        let entity = entity_of::<W>(&self.state)?;
        let mut registry = self.registry.try_borrow_mut().map_err(|_| busy::<W>())?;
        registry.add(entity, value)
    }

    /// Applies `f` to the stored capability in place.
    ///
    /// # Errors
    ///
    /// Same as [`Write::get_mut`].
    pub fn update<T>(&self, f: impl FnOnce(&mut W) -> T) -> TraitResult<T> {
        let mut value = self.get_mut()?;
        Ok(f(&mut value))
    }

    /// Returns the entity this binding resolved to.
    ///
    /// # Errors
    ///
    /// [`TraitError::OutOfScope`] outside an active iteration.
    pub fn entity(&self) -> TraitResult<EntityId> {
        entity_of::<W>(&self.state)
    }

    /// Returns `true` while an iteration owns this binding.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state.borrow().is_some()
    }
}

impl<W: 'static> fmt::Debug for Write<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Write")
            .field("capability", &type_name::<W>())
            .field("bound", &self.is_bound())
            .finish()
    }
}

fn entity_of<W: 'static>(state: &StateCell) -> TraitResult<EntityId> {
    state
        .borrow()
        .as_ref()
        .map(|resolved| resolved.entity)
        .ok_or_else(out_of_scope::<W>)
}

fn stored<T: 'static>(registry: &SharedRegistry, entity: EntityId) -> TraitResult<Ref<'_, T>> {
    let registry = registry.try_borrow().map_err(|_| busy::<T>())?;
    if registry.get::<T>(entity)?.is_none() {
        return Err(vanished::<T>(entity));
    }
    Ref::filter_map(registry, |registry| registry.get::<T>(entity).ok().flatten())
        .map_err(|_| vanished::<T>(entity))
}

fn out_of_scope<W: 'static>() -> TraitError {
    TraitError::OutOfScope {
        capability: type_name::<W>(),
    }
}

fn busy<W: 'static>() -> TraitError {
    TraitError::Busy {
        capability: type_name::<W>(),
    }
}

fn vanished<W: 'static>(entity: EntityId) -> TraitError {
    TraitError::Vanished {
        entity,
        capability: type_name::<W>(),
    }
}
