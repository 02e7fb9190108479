//! # Engine Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! [tick]
//! rate_hz = 20.0
//! max_steps_per_frame = 5
//!
//! [physics]
//! gravity = [0.0, -9.8, 0.0]
//! drag = 0.0
//!
//! [[bodies]]
//! position = { x = 0.0, y = 10.0, z = 0.0 }
//! colliders = [{ min = { x = -0.3, y = 0.0, z = -0.3 }, max = { x = 0.3, y = 1.8, z = 0.3 } }]
//! ```
//!
//! Every section is optional; missing values take the defaults above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxide_core::Elapsed;
use voxide_physics::{Aabb, Gravity, Length, PhysicsError, Speed, Vec3};

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<PhysicsError> for ConfigError {
    fn from(error: PhysicsError) -> Self {
        Self::Invalid(error.to_string())
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fixed-step clock settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Simulation steps per second.
    pub rate_hz: f64,
    /// Most steps run for a single frame before the backlog is dropped.
    pub max_steps_per_frame: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            max_steps_per_frame: 5,
        }
    }
}

impl TickConfig {
    /// Length of one step.
    #[must_use]
    pub fn step(&self) -> Elapsed {
        Elapsed::from_secs_f64(1.0 / self.rate_hz)
    }
}

/// World-wide physics defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector in m/s².
    pub gravity: [f64; 3],
    /// Drag coefficient per second.
    pub drag: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.8, 0.0],
            drag: 0.0,
        }
    }
}

impl PhysicsConfig {
    /// Builds the default gravity capability.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for non-finite gravity or invalid drag.
    pub fn gravity(&self) -> ConfigResult<Gravity> {
        Ok(Gravity::new(Vec3::from_si(self.gravity), self.drag)?)
    }
}

/// A body to spawn at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Starting position.
    pub position: Vec3<Length>,
    /// Starting velocity.
    #[serde(default)]
    pub velocity: Vec3<Speed>,
    /// Local collision boxes.
    #[serde(default)]
    pub colliders: Vec<Aabb>,
    /// Per-body gravity; the world default when absent.
    #[serde(default)]
    pub gravity: Option<Gravity>,
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clock settings.
    pub tick: TickConfig,
    /// Physics defaults.
    pub physics: PhysicsConfig,
    /// Bodies spawned at startup.
    pub bodies: Vec<BodyConfig>,
}

impl EngineConfig {
    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(
            path = %path.display(),
            rate_hz = config.tick.rate_hz,
            bodies = config.bodies.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.tick.rate_hz.is_finite() && self.tick.rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick.rate_hz must be positive and finite, got {}",
                self.tick.rate_hz
            )));
        }
        if self.tick.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "tick.max_steps_per_frame must be at least 1".to_string(),
            ));
        }
        self.physics.gravity()?;
        for (index, body) in self.bodies.iter().enumerate() {
            if !(body.position.is_finite() && body.velocity.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "bodies[{index}] has a non-finite position or velocity"
                )));
            }
            if body.colliders.iter().any(|aabb| !aabb.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "bodies[{index}] has a non-finite collider"
                )));
            }
        }
        Ok(())
    }
}
