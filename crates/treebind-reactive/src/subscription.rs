#![forbid(unsafe_code)]

//! Teardown guards for stream subscriptions.
//!
//! A [`Subscription`] owns the resources keeping a callback registered with
//! an event source. Unsubscription is synchronous and idempotent, and also
//! happens automatically when the guard is dropped.
//!
//! # Invariants
//!
//! 1. The teardown closure runs at most once.
//! 2. `unsubscribe()` after the first call (or after drop) is a no-op.
//! 3. Unsubscribing is safe from inside a callback currently running for
//!    the same subscription: the current invocation completes, later
//!    deliveries are suppressed.

/// RAII guard for a stream subscription.
///
/// Dropping the guard unsubscribes. Call [`unsubscribe`](Self::unsubscribe)
/// to tear down early; repeated calls are no-ops.
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a teardown closure. The closure runs on the first
    /// `unsubscribe()` call or on drop, whichever comes first.
    #[must_use]
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Release the subscription. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    /// Whether the subscription still holds its teardown (i.e. has not been
    /// unsubscribed yet).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn unsubscribe_runs_teardown_once() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let mut sub = Subscription::new(move || count_clone.set(count_clone.get() + 1));

        assert!(sub.is_active());
        sub.unsubscribe();
        assert_eq!(count.get(), 1);
        assert!(!sub.is_active());

        // Second call is a no-op.
        sub.unsubscribe();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_unsubscribes() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        {
            let _sub = Subscription::new(move || count_clone.set(count_clone.get() + 1));
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_after_unsubscribe_does_not_rerun() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        {
            let mut sub = Subscription::new(move || count_clone.set(count_clone.get() + 1));
            sub.unsubscribe();
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn debug_reports_active_state() {
        let mut sub = Subscription::new(|| {});
        assert!(format!("{sub:?}").contains("true"));
        sub.unsubscribe();
        assert!(format!("{sub:?}").contains("false"));
    }
}
