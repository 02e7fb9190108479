//! # VOXIDE Core
//!
//! Entity-capability runtime for the VOXIDE voxel simulation:
//! - A registry storing at most one value per concrete type per entity
//! - Capability keys pairing a writable type with a read-only view
//! - Systems (one iteration per matching entity per tick) and event sinks
//!   (one iteration per event) sharing a single binding resolver
//!
//! ## Resolution Rules
//!
//! 1. **All or nothing** - an iteration runs only if every binding resolves
//! 2. **Missing is not an error** - unresolved iterations are skipped silently
//! 3. **Scoped accessors** - bindings are live only inside their iteration
//!
//! ## Example
//!
//! ```rust,ignore
//! use voxide_core::{CapabilityKey, Elapsed, Registry, SystemBuilder};
//!
//! let registry = Registry::new().shared();
//! let mut builder = SystemBuilder::new(&registry);
//! let counter = builder.write(&CapabilityKey::<Counter>::identity());
//! builder.body(move |_, _| { counter.update(|c| c.0 += 1)?; Ok(()) });
//! let mut system = builder.build();
//! system.tick(Elapsed::from_millis(50.0))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod binding;
pub mod capability;
pub mod entity;
pub mod error;
pub mod handle;
pub mod registry;
pub mod sink;
pub mod source;
pub mod system;
pub mod tick;
pub mod time;

pub use binding::{Read, Target, Write};
pub use capability::{CapabilityKey, CapabilityTag};
pub use entity::{EntityId, RegistryId};
pub use error::{HandlerError, TraitError, TraitResult};
pub use handle::EntityHandle;
pub use registry::{Registry, SharedRegistry};
pub use sink::{BoundSink, Delivery, EventHandler, EventSink, EventSinkBuilder};
pub use source::{EventChannel, EventSender, PumpReport};
pub use system::{System, SystemBody, SystemBuilder, TickReport};
pub use tick::{Subscription, TickBus, TickCallback, TickSource};
pub use time::Elapsed;
