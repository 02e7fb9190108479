//! # Tick Sources
//!
//! A tick source pushes elapsed time to its subscribers. Subscribing returns
//! a [`Subscription`]; closing it (explicitly or by dropping it) unsubscribes.
//!
//! [`TickBus`] is the in-process source: whoever owns the clock calls
//! [`TickBus::advance`] once per step.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::time::Elapsed;

/// Callback invoked once per tick.
pub type TickCallback = Box<dyn FnMut(Elapsed)>;

/// Anything that delivers ticks to subscribers.
pub trait TickSource {
    /// Registers `callback` for every subsequent tick.
    fn subscribe(&self, callback: TickCallback) -> Subscription;
}

/// Live registration with a source.
///
/// [`Subscription::close`] unsubscribes; calling it again does nothing.
/// Dropping an open subscription closes it.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    closer: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `closer` when closed.
    pub fn new(closer: impl FnOnce() + 'static) -> Self {
        Self {
            closer: Some(Box::new(closer)),
        }
    }

    /// Unsubscribes. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
    }

    /// Returns `true` once the subscription has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closer.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

type SharedCallback = Rc<RefCell<TickCallback>>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    subscribers: Vec<(u64, SharedCallback)>,
}

/// Single-threaded fan-out tick source.
///
/// Subscribers run in subscription order. Subscriptions opened or closed
/// during a broadcast take effect from the next one.
#[derive(Clone, Default)]
pub struct TickBus {
    state: Rc<RefCell<BusState>>,
}

impl TickBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one tick to every subscriber. Returns how many were called.
    ///
    /// A subscriber that re-enters the bus from its own callback is skipped
    /// for the nested broadcast.
    pub fn advance(&self, elapsed: Elapsed) -> usize {
        let callbacks: Vec<SharedCallback> = self
            .state
            .borrow()
            .subscribers
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        let mut delivered = 0;
        for callback in callbacks {
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)(elapsed);
                delivered += 1;
            }
        }
        delivered
    }

    /// Returns the number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}

impl TickSource for TickBus {
    fn subscribe(&self, callback: TickCallback) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.push((id, Rc::new(RefCell::new(callback))));
            id
        };
        tracing::debug!(subscription = id, "tick subscription opened");

        let state: Weak<RefCell<BusState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .borrow_mut()
                    .subscribers
                    .retain(|(subscriber, _)| *subscriber != id);
                tracing::debug!(subscription = id, "tick subscription closed");
            }
        })
    }
}

impl fmt::Debug for TickBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
