//! # Physics Error Types
//!
//! Argument errors raised when a physics capability is built or changed with
//! invalid values. Checked at the point of assignment, never deferred.

use thiserror::Error;

/// Errors that can occur when configuring physics capabilities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Drag must be finite and non-negative.
    #[error("invalid drag coefficient {0}: must be finite and non-negative")]
    InvalidDrag(f64),

    /// Every gravity component must be finite.
    #[error("gravity vector {0:?} has a non-finite component")]
    NonFiniteGravity([f64; 3]),
}

/// Result type for physics configuration.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
