//! # Runtime Error Types
//!
//! All errors that can escape the capability runtime.
//!
//! Missing capabilities during resolution and rejected tick durations are
//! filtering outcomes, not errors, and never appear here.

use thiserror::Error;

use crate::entity::EntityId;

/// Error returned by a system body or event handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the capability runtime.
#[derive(Error, Debug)]
pub enum TraitError {
    /// A lifecycle or capability operation targeted a destroyed identity.
    #[error("entity {0} is destroyed")]
    Destroyed(EntityId),

    /// The identity was minted by a different registry.
    #[error("entity {0} does not belong to this registry")]
    ForeignEntity(EntityId),

    /// A binding accessor was used while no iteration owns it.
    #[error("binding for `{capability}` accessed outside of an active iteration")]
    OutOfScope {
        /// Type name of the bound capability.
        capability: &'static str,
    },

    /// The registry or a bound capability is already borrowed.
    #[error("`{capability}` is already borrowed")]
    Busy {
        /// Type name of the borrowed capability or registry.
        capability: &'static str,
    },

    /// A bound capability was removed from its entity during the iteration.
    #[error("capability `{capability}` was removed from entity {entity} during the iteration")]
    Vanished {
        /// Entity the binding resolved to.
        entity: EntityId,
        /// Type name of the bound capability.
        capability: &'static str,
    },

    /// A system body failed.
    #[error("handler failed for entity {entity}: {source}")]
    Handler {
        /// Entity the failing iteration was resolved for.
        entity: EntityId,
        /// The error returned by the handler.
        #[source]
        source: HandlerError,
    },

    /// An event handler failed.
    #[error("event handler failed: {source}")]
    EventHandler {
        /// The error returned by the handler.
        #[source]
        source: HandlerError,
    },
}

impl TraitError {
    /// Returns `true` for lifecycle errors (destroyed or foreign identity).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Destroyed(_) | Self::ForeignEntity(_))
    }

    /// Returns `true` for binding-scope errors.
    #[must_use]
    pub fn is_out_of_scope(&self) -> bool {
        matches!(self, Self::OutOfScope { .. })
    }
}

/// Result type for runtime operations.
pub type TraitResult<T> = Result<T, TraitError>;
