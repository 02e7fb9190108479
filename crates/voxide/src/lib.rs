//! # VOXIDE
//!
//! The integration crate: configuration, the fixed-step clock and a world
//! that wires the capability runtime to the rigidbody simulation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           VOXIDE                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌────────────────┐   ┌──────────────┐  │
//! │  │  voxide_core   │   │ voxide_physics │   │    voxide    │  │
//! │  │                │<──│                │<──│              │  │
//! │  │  • Registry    │   │  • Units/Vec3  │   │  • Config    │  │
//! │  │  • Bindings    │   │  • AABB        │   │  • Timestep  │  │
//! │  │  • Systems     │   │  • Geometry    │   │  • Engine    │  │
//! │  │  • Event sinks │   │  • Rigidbody   │   │              │  │
//! │  └────────────────┘   └────────────────┘   └──────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML engine configuration
//! - `game_loop`: Frame time to fixed steps
//! - `engine`: Body spawning and the simulation world

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod game_loop;

pub use voxide_core as core;
pub use voxide_physics as physics;

pub use config::{BodyConfig, ConfigError, ConfigResult, EngineConfig, PhysicsConfig, TickConfig};
pub use engine::{spawn_body, Engine};
pub use game_loop::{FixedTimestep, FrameStats};
