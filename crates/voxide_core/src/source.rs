//! # Event Channels
//!
//! Cross-thread event delivery into a single-threaded sink.
//!
//! Producers hold an [`EventSender`] and may live on any thread. The thread
//! that owns the registry calls [`EventChannel::pump`] to push pending events
//! into an [`EventSink`] in channel order.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::error::TraitResult;
use crate::sink::{Delivery, EventSink};

/// Counts from one [`EventChannel::pump`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Events the sink handled.
    pub handled: usize,
    /// Events the sink dropped.
    pub dropped: usize,
}

impl PumpReport {
    /// Total events taken off the channel.
    #[inline]
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.handled + self.dropped
    }
}

/// Multi-producer channel of events for one consumer thread.
pub struct EventChannel<E> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E> EventChannel<E> {
    /// Creates a channel with no capacity limit.
    #[must_use]
    pub fn unbounded() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Creates a channel holding at most `capacity` pending events.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender<E> {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Delivers every event pending at call time into `sink`.
    ///
    /// Events sent while pumping wait for the next call.
    ///
    /// # Errors
    ///
    /// The first error returned by the sink. Events after it stay queued.
    pub fn pump(&self, sink: &mut dyn EventSink<E>) -> TraitResult<PumpReport> {
        let mut report = PumpReport::default();
        for _ in 0..self.receiver.len() {
            let Ok(event) = self.receiver.try_recv() else {
                break;
            };
            match sink.put(event)? {
                Delivery::Handled => report.handled += 1,
                Delivery::Dropped => report.dropped += 1,
            }
        }
        Ok(report)
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Handle for sending events.
pub struct EventSender<E> {
    sender: Sender<E>,
}

impl<E> EventSender<E> {
    /// Sends an event without blocking.
    ///
    /// Returns `false` if the channel is full or the channel was dropped.
    #[inline]
    pub fn send(&self, event: E) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }

    /// Sends an event, waiting for room in a bounded channel.
    ///
    /// Returns `false` if the channel was dropped.
    #[inline]
    pub fn send_blocking(&self, event: E) -> bool {
        self.sender.send(event).is_ok()
    }
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
