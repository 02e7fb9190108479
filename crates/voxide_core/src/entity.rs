//! # Entity Identity
//!
//! Entities are lightweight identifiers consisting of:
//! - The tag of the registry that minted them
//! - An index into the registry's slot table
//! - A generation counter so a reused slot never revives a destroyed identity

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of registry tags. Each registry instance takes the next value.
static NEXT_REGISTRY: AtomicU32 = AtomicU32::new(0);

/// Tag identifying one registry instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RegistryId(u32);

impl RegistryId {
    /// Allocates a tag no other registry in this process holds.
    pub(crate) fn next() -> Self {
        Self(NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Unique identifier for an entity.
///
/// Equality is registry-scoped: two identities minted by different
/// registries never compare equal, even with the same index and generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    registry: u32,
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates an entity ID from its parts.
    #[inline]
    #[must_use]
    pub(crate) const fn new(registry: RegistryId, index: u32, generation: u32) -> Self {
        Self {
            registry: registry.0,
            index,
            generation,
        }
    }

    /// Returns the tag of the registry that minted this ID.
    #[inline]
    #[must_use]
    pub const fn registry(self) -> RegistryId {
        RegistryId(self.registry)
    }

    /// Returns the slot index portion of the ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation portion of the ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}@r{}", self.index, self.generation, self.registry)
    }
}
