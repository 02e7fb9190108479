//! # Fixed-Timestep Driver
//!
//! Turns variable frame times into fixed simulation steps:
//!
//! ```text
//! frame time ──> accumulator ──┬─> step ──> TickBus::advance ──> systems
//!                              ├─> step ──> ...
//!                              └─> remainder (carried to the next frame)
//! ```
//!
//! At most `max_steps_per_frame` steps run per frame. A larger backlog is
//! dropped (keeping the sub-step remainder) so a stalled frame cannot cause
//! a catch-up spiral.

use std::time::Instant;

use voxide_core::{Elapsed, TickBus};

use crate::config::TickConfig;

/// Statistics for one [`FixedTimestep::advance`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Steps delivered to the bus.
    pub steps: u32,
    /// Whole steps discarded because the frame fell behind.
    pub dropped: u64,
    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    pub alpha: f64,
}

/// Accumulates frame time and emits fixed steps into a [`TickBus`].
#[derive(Debug)]
pub struct FixedTimestep {
    step: Elapsed,
    max_steps: u32,
    accumulator: f64,
    bus: TickBus,
    total_steps: u64,
    last_frame: Option<Instant>,
}

impl FixedTimestep {
    /// Creates a driver from validated clock settings.
    #[must_use]
    pub fn new(config: &TickConfig) -> Self {
        Self {
            step: config.step(),
            max_steps: config.max_steps_per_frame.max(1),
            accumulator: 0.0,
            bus: TickBus::new(),
            total_steps: 0,
            last_frame: None,
        }
    }

    /// The bus steps are delivered to. Subscribe systems here.
    #[must_use]
    pub fn bus(&self) -> &TickBus {
        &self.bus
    }

    /// Length of one step.
    #[inline]
    #[must_use]
    pub fn step(&self) -> Elapsed {
        self.step
    }

    /// Steps delivered since creation.
    #[inline]
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Adds `frame` to the accumulator and delivers the steps it covers.
    ///
    /// Invalid frame times are ignored.
    pub fn advance(&mut self, frame: Elapsed) -> FrameStats {
        let step = self.step.as_secs_f64();
        if !frame.is_valid() || !(step.is_finite() && step > 0.0) {
            return FrameStats {
                alpha: self.alpha(),
                ..FrameStats::default()
            };
        }

        self.accumulator += frame.as_secs_f64();
        let mut stats = FrameStats::default();
        while self.accumulator >= step && stats.steps < self.max_steps {
            self.bus.advance(self.step);
            self.accumulator -= step;
            stats.steps += 1;
        }
        self.total_steps += u64::from(stats.steps);

        if self.accumulator >= step {
            let backlog = (self.accumulator / step).floor();
            self.accumulator -= backlog * step;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let dropped = backlog as u64;
            stats.dropped = dropped;
            tracing::warn!(
                dropped,
                max_steps = self.max_steps,
                "fixed timestep fell behind, dropping backlog"
            );
        }

        stats.alpha = self.alpha();
        stats
    }

    /// Advances by the wall-clock time since the previous call.
    ///
    /// The first call only starts the clock.
    pub fn advance_wall_clock(&mut self) -> FrameStats {
        let now = Instant::now();
        let frame = self
            .last_frame
            .replace(now)
            .map_or(Elapsed::ZERO, |last| Elapsed::from(now.duration_since(last)));
        self.advance(frame)
    }

    /// Fraction of a step waiting in the accumulator, for interpolation.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        let step = self.step.as_secs_f64();
        if step > 0.0 {
            self.accumulator / step
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use voxide_core::TickSource;

    fn driver(rate_hz: f64, max_steps_per_frame: u32) -> FixedTimestep {
        FixedTimestep::new(&TickConfig {
            rate_hz,
            max_steps_per_frame,
        })
    }

    fn counting(driver: &FixedTimestep) -> (Rc<Cell<u32>>, voxide_core::Subscription) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let subscription = driver
            .bus()
            .subscribe(Box::new(move |_| seen.set(seen.get() + 1)));
        (count, subscription)
    }

    #[test]
    fn test_steps_and_remainder() {
        let mut driver = driver(10.0, 5);
        let (count, _subscription) = counting(&driver);

        let stats = driver.advance(Elapsed::from_millis(250.0));
        assert_eq!(stats.steps, 2);
        assert_eq!(stats.dropped, 0);
        assert!((stats.alpha - 0.5).abs() < 1e-9);

        let stats = driver.advance(Elapsed::from_millis(60.0));
        assert_eq!(stats.steps, 1);
        assert_eq!(count.get(), 3);
        assert_eq!(driver.total_steps(), 3);
    }

    #[test]
    fn test_backlog_is_clamped() {
        let mut driver = driver(20.0, 3);
        let (count, _subscription) = counting(&driver);

        let stats = driver.advance(Elapsed::from_millis(1_025.0));
        assert_eq!(stats.steps, 3);
        assert_eq!(stats.dropped, 17);
        assert!((stats.alpha - 0.5).abs() < 1e-6);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_invalid_frame_is_ignored() {
        let mut driver = driver(20.0, 3);
        let (count, _subscription) = counting(&driver);

        assert_eq!(driver.advance(Elapsed::from_millis(-5.0)).steps, 0);
        assert_eq!(driver.advance(Elapsed::INFINITE).steps, 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_each_step_has_fixed_length() {
        let mut driver = driver(4.0, 10);
        let total = Rc::new(Cell::new(0.0));
        let sum = Rc::clone(&total);
        let _subscription = driver
            .bus()
            .subscribe(Box::new(move |elapsed| sum.set(sum.get() + elapsed.as_secs_f64())));

        driver.advance(Elapsed::from_secs_f64(1.1));
        assert!((total.get() - 1.0).abs() < 1e-12);
    }
}
