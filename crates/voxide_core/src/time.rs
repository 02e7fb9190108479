//! # Elapsed Time
//!
//! Tick durations as plain `f64` seconds. Unlike [`std::time::Duration`],
//! an [`Elapsed`] can hold negative and non-finite values, so drivers can
//! represent bad input and reject it.

use std::fmt;
use std::time::Duration;

/// Time elapsed since the previous tick, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Elapsed(f64);

impl Elapsed {
    /// No time passed.
    pub const ZERO: Self = Self(0.0);

    /// Infinite duration. Always rejected by tick drivers.
    pub const INFINITE: Self = Self(f64::INFINITY);

    /// Creates an elapsed time from seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs_f64(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Creates an elapsed time from milliseconds.
    #[inline]
    #[must_use]
    pub fn from_millis(millis: f64) -> Self {
        Self(millis / 1_000.0)
    }

    /// Returns the duration in seconds.
    #[inline]
    #[must_use]
    pub const fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Returns `true` if the duration is finite and not negative.
    ///
    /// Ticks with an invalid duration are no-ops.
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl From<Duration> for Elapsed {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs_f64())
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
