//! # VOXIDE Physics
//!
//! Rigid bodies moving through static voxel geometry.
//!
//! ## Architecture Rules
//!
//! 1. **No rotation** - bodies are axis-aligned boxes that only translate
//! 2. **Vertical first** - movement resolves Y, then X, then Z
//! 3. **Never fault on geometry** - broken boxes mean "no collision"
//!
//! ## Example
//!
//! ```rust,ignore
//! use voxide_physics::{RigidbodySimulation, VoxelGeometry};
//!
//! let geometry = Arc::new(VoxelGeometry::new());
//! geometry.fill((-8, -1, -8), (8, -1, 8));
//! let mut simulation = RigidbodySimulation::new(&registry, geometry);
//! simulation.tick(Elapsed::from_millis(50.0))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod aabb;
pub mod components;
pub mod error;
pub mod geometry;
pub mod rigidbody;
pub mod units;

pub use aabb::Aabb;
pub use components::{Colliders, Gravity, Grounded, Position, Velocity};
pub use error::{PhysicsError, PhysicsResult};
pub use geometry::{StaticGeometry, VoxelCoord, VoxelGeometry, WorldGeometry};
pub use rigidbody::{step, RigidbodySimulation, StepOutcome};
pub use units::{Acceleration, Axis, Length, Quantity, Speed, Vec3};
