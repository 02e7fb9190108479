//! # Entity Registry
//!
//! The central container for entity identities and their capabilities.
//!
//! ## Layout
//!
//! ```text
//! slots:  [Slot0, Slot1, Slot2, ...]       indexed by EntityId::index
//!           │
//!           └─ generation, alive,
//!              capabilities: HashMap<TypeId, Box<dyn Any>>
//!
//! free_indices: destroyed slots waiting for reuse
//! ```
//!
//! A destroyed slot is reused with a bumped generation, so the destroyed
//! identity can never be revived. Every operation on a destroyed identity is
//! a lifecycle error.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::capability::CapabilityTag;
use crate::entity::{EntityId, RegistryId};
use crate::error::{TraitError, TraitResult};

/// A registry shared between the systems and sinks driving it.
///
/// The registry is single-threaded; sharing happens within one execution
/// context only.
pub type SharedRegistry = Rc<RefCell<Registry>>;

/// Builds a list of [`CapabilityTag`]s from capability types.
///
/// ```rust,ignore
/// let movers = registry.query(&tags![Position, Velocity]);
/// ```
#[macro_export]
macro_rules! tags {
    ($($ty:ty),* $(,)?) => {
        [$($crate::CapabilityTag::of::<$ty>()),*]
    };
}

/// One entity slot.
struct Slot {
    generation: u32,
    alive: bool,
    capabilities: HashMap<TypeId, Box<dyn Any>>,
}

impl Slot {
    fn fresh() -> Self {
        Self {
            generation: 0,
            alive: true,
            capabilities: HashMap::new(),
        }
    }

    fn holds(&self, tag: CapabilityTag) -> bool {
        self.capabilities.contains_key(&tag.type_id())
    }
}

/// Owns entity identities and their capability maps.
pub struct Registry {
    tag: RegistryId,
    slots: Vec<Slot>,
    /// Destroyed slot indices available for reuse.
    free_indices: Vec<u32>,
    alive_count: usize,
}

impl Registry {
    /// Creates an empty registry with its own identity namespace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: RegistryId::next(),
            slots: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Wraps the registry for sharing with systems and sinks.
    #[must_use]
    pub fn shared(self) -> SharedRegistry {
        Rc::new(RefCell::new(self))
    }

    /// Returns this registry's identity namespace.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RegistryId {
        self.tag
    }

    /// Returns the number of alive entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive_count
    }

    /// Returns `true` if no entity is alive.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Creates a new entity with no capabilities.
    pub fn create(&mut self) -> EntityId {
        let id = if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.alive = true;
            EntityId::new(self.tag, index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot::fresh());
            EntityId::new(self.tag, index, 0)
        };
        self.alive_count += 1;
        tracing::trace!(entity = %id, "entity created");
        id
    }

    /// Checks if an entity is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slot(id).is_ok()
    }

    /// Adds a capability, replacing any capability of the same concrete type.
    ///
    /// Returns the replaced value, if any.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn add<T: 'static>(&mut self, id: EntityId, capability: T) -> TraitResult<Option<T>> {
        let previous = self
            .slot_mut(id)?
            .capabilities
            .insert(TypeId::of::<T>(), Box::new(capability));
        Ok(previous.and_then(|boxed| boxed.downcast::<T>().ok()).map(|boxed| *boxed))
    }

    /// Gets a capability by type. `None` if the entity lacks it.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn get<T: 'static>(&self, id: EntityId) -> TraitResult<Option<&T>> {
        Ok(self
            .slot(id)?
            .capabilities
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>()))
    }

    /// Gets a mutable capability by type. `None` if the entity lacks it.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn get_mut<T: 'static>(&mut self, id: EntityId) -> TraitResult<Option<&mut T>> {
        Ok(self
            .slot_mut(id)?
            .capabilities
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>()))
    }

    /// Removes a capability, returning it. `None` if the entity lacks it.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn remove<T: 'static>(&mut self, id: EntityId) -> TraitResult<Option<T>> {
        let removed = self.slot_mut(id)?.capabilities.remove(&TypeId::of::<T>());
        Ok(removed.and_then(|boxed| boxed.downcast::<T>().ok()).map(|boxed| *boxed))
    }

    /// Checks whether the entity holds a capability of type `T`.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn has<T: 'static>(&self, id: EntityId) -> TraitResult<bool> {
        self.has_tag(id, CapabilityTag::of::<T>())
    }

    /// Type-erased variant of [`Registry::has`].
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn has_tag(&self, id: EntityId, tag: CapabilityTag) -> TraitResult<bool> {
        Ok(self.slot(id)?.holds(tag))
    }

    /// Returns how many capabilities the entity holds.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is destroyed or foreign.
    pub fn capability_count(&self, id: EntityId) -> TraitResult<usize> {
        Ok(self.slot(id)?.capabilities.len())
    }

    /// Destroys an entity and drops all of its capabilities.
    ///
    /// # Errors
    ///
    /// Lifecycle error if `id` is already destroyed or foreign.
    pub fn destroy(&mut self, id: EntityId) -> TraitResult<()> {
        let slot = self.slot_mut(id)?;
        slot.alive = false;
        slot.capabilities.clear();
        // A slot whose generation cannot advance is retired for good.
        if slot.generation < u32::MAX {
            self.free_indices.push(id.index());
        }
        self.alive_count -= 1;
        tracing::trace!(entity = %id, "entity destroyed");
        Ok(())
    }

    /// Returns every alive entity holding all of `required`.
    ///
    /// An empty `required` matches every alive entity. Results are in slot
    /// order and reflect the registry at call time only.
    #[must_use]
    pub fn query(&self, required: &[CapabilityTag]) -> Vec<EntityId> {
        self.alive_slots()
            .filter(|(_, slot)| required.iter().all(|tag| slot.holds(*tag)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Iterates over all alive entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive_slots().map(|(id, _)| id)
    }

    /// Type-erased lookup used by the binding resolver.
    pub(crate) fn get_any(&self, id: EntityId, tag: CapabilityTag) -> TraitResult<Option<&dyn Any>> {
        Ok(self
            .slot(id)?
            .capabilities
            .get(&tag.type_id())
            .map(|boxed| boxed.as_ref()))
    }

    fn alive_slots(&self) -> impl Iterator<Item = (EntityId, &Slot)> + '_ {
        let tag = self.tag;
        self.slots
            .iter()
            .zip(0u32..)
            .filter(|(slot, _)| slot.alive)
            .map(move |(slot, index)| (EntityId::new(tag, index, slot.generation), slot))
    }

    fn check(&self, id: EntityId) -> TraitResult<usize> {
        if id.registry() != self.tag {
            return Err(TraitError::ForeignEntity(id));
        }
        let index = id.index() as usize;
        match self.slots.get(index) {
            Some(slot) if slot.alive && slot.generation == id.generation() => Ok(index),
            _ => Err(TraitError::Destroyed(id)),
        }
    }

    fn slot(&self, id: EntityId) -> TraitResult<&Slot> {
        let index = self.check(id)?;
        Ok(&self.slots[index])
    }

    fn slot_mut(&mut self, id: EntityId) -> TraitResult<&mut Slot> {
        let index = self.check(id)?;
        Ok(&mut self.slots[index])
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.tag)
            .field("alive", &self.alive_count)
            .field("slots", &self.slots.len())
            .finish()
    }
}
