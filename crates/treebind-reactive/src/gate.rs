#![forbid(unsafe_code)]

//! Deferred event delivery.
//!
//! Registration typically happens while the registering node's own setup
//! is still executing. Delivering structural events synchronously would
//! force one observer to update while another is mid-setup, which hosting
//! environments disallow. The gate moves every delivery to a later
//! [`Scheduler`] tick instead, strictly after the current pass completes.
//!
//! # Invariants
//!
//! 1. No delivery happens within the emitting call; every event is
//!    redelivered on a later tick.
//! 2. Relative order among events from the same source is preserved.
//! 3. Cancelling the returned subscription suppresses deliveries already
//!    queued but not yet run, as well as all future ones.

use std::cell::Cell;
use std::rc::Rc;

use crate::emitter::Emitter;
use crate::observable::Observable;
use crate::scheduler::Scheduler;
use crate::subscription::Subscription;

/// Anything a gated subscription can be attached to.
///
/// The seam between concrete stream types and the gate: both plain event
/// streams and value cells can feed deferred consumers.
pub trait EventSource<T> {
    /// Register a boxed callback for every subsequent event.
    fn on_event(&self, f: Box<dyn Fn(&T)>) -> Subscription;
}

impl<T: 'static> EventSource<T> for Emitter<T> {
    fn on_event(&self, f: Box<dyn Fn(&T)>) -> Subscription {
        self.subscribe(f)
    }
}

impl<T: Clone + PartialEq + 'static> EventSource<T> for Observable<T> {
    fn on_event(&self, f: Box<dyn Fn(&T)>) -> Subscription {
        self.subscribe(f)
    }
}

/// Subscribe to `source`, redelivering every event on a later tick of
/// `scheduler`.
///
/// Events are cloned at emission time and delivered in emission order.
/// The returned subscription cancels both the underlying subscription and
/// any deliveries still sitting in the queue.
#[must_use = "dropping the subscription immediately unsubscribes"]
pub fn deferred<T, S>(
    scheduler: &Scheduler,
    source: &S,
    f: impl Fn(&T) + 'static,
) -> Subscription
where
    T: Clone + 'static,
    S: EventSource<T>,
{
    let alive = Rc::new(Cell::new(true));
    let callback = Rc::new(f);
    let scheduler = scheduler.clone();

    let alive_src = Rc::clone(&alive);
    let inner = source.on_event(Box::new(move |value: &T| {
        if !alive_src.get() {
            return;
        }
        let value = value.clone();
        let callback = Rc::clone(&callback);
        let alive = Rc::clone(&alive_src);
        scheduler.defer(move || {
            if alive.get() {
                callback(&value);
            }
        });
    }));

    Subscription::new(move || {
        alive.set(false);
        drop(inner);
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn delivery_is_never_synchronous() {
        let scheduler = Scheduler::new();
        let emitter: Emitter<i32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let _sub = deferred(&scheduler, &emitter, move |v| s.borrow_mut().push(*v));

        emitter.emit(&1);
        assert!(seen.borrow().is_empty());
        assert_eq!(scheduler.pending(), 1);

        scheduler.drain();
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn order_within_a_source_is_preserved() {
        let scheduler = Scheduler::new();
        let emitter: Emitter<i32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let _sub = deferred(&scheduler, &emitter, move |v| s.borrow_mut().push(*v));

        for i in 0..5 {
            emitter.emit(&i);
        }
        scheduler.drain();
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn merged_sources_share_the_tick_queue() {
        let scheduler = Scheduler::new();
        let a: Emitter<&'static str> = Emitter::new();
        let b: Emitter<&'static str> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let _sa = deferred(&scheduler, &a, move |v| s.borrow_mut().push(*v));
        let s = Rc::clone(&seen);
        let _sb = deferred(&scheduler, &b, move |v| s.borrow_mut().push(*v));

        a.emit(&"a1");
        b.emit(&"b1");
        a.emit(&"a2");
        scheduler.drain();
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "a2"]);
    }

    #[test]
    fn cancel_suppresses_queued_deliveries() {
        let scheduler = Scheduler::new();
        let emitter: Emitter<i32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let mut sub = deferred(&scheduler, &emitter, move |v| s.borrow_mut().push(*v));

        emitter.emit(&1);
        assert_eq!(scheduler.pending(), 1);
        sub.unsubscribe();

        scheduler.drain();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn cancel_stops_future_events() {
        let scheduler = Scheduler::new();
        let emitter: Emitter<i32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let mut sub = deferred(&scheduler, &emitter, move |v| s.borrow_mut().push(*v));

        emitter.emit(&1);
        scheduler.drain();
        sub.unsubscribe();
        emitter.emit(&2);
        scheduler.drain();
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn observable_sources_are_gated_too() {
        let scheduler = Scheduler::new();
        let cell = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let _sub = deferred(&scheduler, &cell, move |v| s.borrow_mut().push(*v));

        cell.set(3);
        assert!(seen.borrow().is_empty());
        scheduler.drain();
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn event_emitted_during_drain_lands_in_same_drain() {
        let scheduler = Scheduler::new();
        let emitter: Emitter<i32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let e = emitter.clone();
        let _sub = deferred(&scheduler, &emitter, move |v| {
            s.borrow_mut().push(*v);
            if *v == 1 {
                e.emit(&2);
            }
        });

        emitter.emit(&1);
        scheduler.drain();
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }
}
