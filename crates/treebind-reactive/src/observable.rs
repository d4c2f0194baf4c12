#![forbid(unsafe_code)]

//! Version-tracked value cells with change notification.
//!
//! [`Observable<T>`] pairs a current value with a change stream. It is the
//! storage primitive behind leaf values and indirect-reference targets, and
//! the output side of the engine's unified value streams.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. The change stream's most recent emission always equals the current
//!    held value.
//! 5. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::emitter::Emitter;
use crate::subscription::Subscription;

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    version: Cell<u64>,
    changed: Emitter<T>,
}

/// A shared, version-tracked value wrapper with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** cell.
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a cell holding `value`, at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                changed: Emitter::new(),
            }),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Equal values are a no-op; otherwise the version
    /// is bumped and subscribers are notified with the new value.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value.clone();
            self.inner.version.set(self.inner.version.get() + 1);
        }
        // Borrow released before notification so callbacks may read or set.
        self.inner.changed.emit(&value);
    }

    /// Register a callback invoked with each new value after a change.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.inner.changed.subscribe(f)
    }

    /// Monotonically increasing change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of live change subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changed.subscriber_count()
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn get_returns_initial_value() {
        let cell = Observable::new(42);
        assert_eq!(cell.get(), 42);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn set_notifies_with_new_value() {
        let cell = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| s.borrow_mut().push(*v));

        cell.set(1);
        cell.set(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(cell.get(), 2);
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn equal_set_is_a_no_op() {
        let cell = Observable::new(5);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| s.borrow_mut().push(*v));

        cell.set(5);
        assert!(seen.borrow().is_empty());
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn last_emission_equals_current_value() {
        let cell = Observable::new(String::new());
        let last = Rc::new(RefCell::new(None));
        let l = Rc::clone(&last);
        let _sub = cell.subscribe(move |v: &String| *l.borrow_mut() = Some(v.clone()));

        for value in ["a", "b", "c"] {
            cell.set(value.to_string());
            assert_eq!(last.borrow().as_deref(), Some(value));
            assert_eq!(cell.get(), value);
        }
    }

    #[test]
    fn with_borrows_without_cloning() {
        let cell = Observable::new(vec![1, 2, 3]);
        let sum: i32 = cell.with(|v| v.iter().sum());
        assert_eq!(sum, 6);
    }

    #[test]
    fn dropped_subscription_is_not_notified() {
        let cell = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = cell.subscribe(move |v| s.borrow_mut().push(*v));
        cell.set(1);
        drop(sub);
        cell.set(2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn callback_may_read_the_cell() {
        let cell = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let cell_clone = cell.clone();
        let _sub = cell.subscribe(move |_| s.borrow_mut().push(cell_clone.get()));
        cell.set(9);
        assert_eq!(*seen.borrow(), vec![9]);
    }

    #[test]
    fn clone_shares_state() {
        let cell = Observable::new(1);
        let other = cell.clone();
        cell.set(2);
        assert_eq!(other.get(), 2);
        assert_eq!(other.version(), 1);
    }
}
