#![forbid(unsafe_code)]

//! Subscriber-list event streams.
//!
//! [`Emitter<T>`] is the push side of every stream in treebind: structural
//! change notifications, value changes, and rebind events all flow through
//! one. It is single-threaded (`Rc` inside) and cheap to clone — clones
//! share the same subscriber list.
//!
//! # Architecture
//!
//! Subscribers are stored as `Weak` function pointers; the returned
//! [`Subscription`] holds the only strong reference. Dead entries are
//! cleaned up lazily during notification.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A subscriber unsubscribed mid-emission is not delivered the
//!    remainder of that pass (each weak is upgraded immediately before its
//!    call).
//! 3. Emitting from inside a callback is allowed; the nested pass uses its
//!    own snapshot of the subscriber list.
//! 4. A subscriber added during an emission pass is not notified by that
//!    pass.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::subscription::Subscription;

type Callback<T> = dyn Fn(&T);

struct EmitterInner<T: 'static> {
    subscribers: RefCell<SmallVec<[Weak<Callback<T>>; 2]>>,
}

/// A single-threaded event stream with callback subscribers.
pub struct Emitter<T: 'static> {
    inner: Rc<EmitterInner<T>>,
}

impl<T: 'static> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Emitter<T> {
    /// Create an emitter with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                subscribers: RefCell::new(SmallVec::new()),
            }),
        }
    }

    /// Register a callback for every subsequent emission.
    ///
    /// The returned guard is the only thing keeping the callback alive:
    /// dropping it unsubscribes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(f);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&callback));
        Subscription::new(move || drop(callback))
    }

    /// Deliver `value` to every live subscriber, in registration order.
    pub fn emit(&self, value: &T) {
        // Snapshot the list so callbacks may subscribe/unsubscribe freely;
        // upgrade each weak right before the call so a mid-pass cancel
        // suppresses the remaining delivery.
        let snapshot: SmallVec<[Weak<Callback<T>>; 2]> =
            self.inner.subscribers.borrow().iter().cloned().collect();
        for weak in &snapshot {
            if let Some(callback) = weak.upgrade() {
                callback(value);
            }
        }
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0);
    }

    /// Number of live subscribers. Prunes dead entries as a side effect.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.len()
    }
}

impl<T: 'static> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
