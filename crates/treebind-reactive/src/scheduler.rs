#![forbid(unsafe_code)]

//! Deferred-task scheduling for single-threaded cooperative delivery.
//!
//! The [`Scheduler`] is the "next tick" abstraction: a FIFO queue of
//! deferred closures, drained by whoever owns the loop — a host runtime in
//! production, the test itself in tests. Nothing runs until the queue is
//! driven, which is what makes deferred delivery deterministic.
//!
//! # Invariants
//!
//! 1. Tasks run in the order they were deferred (FIFO).
//! 2. A task deferred while a drain is in progress runs within that same
//!    drain, after everything queued before it.
//! 3. A reentrant `drain()` call from inside a task is a no-op; the outer
//!    drain keeps the queue.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

struct SchedulerInner {
    queue: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
}

/// A manually-driven FIFO task queue.
///
/// Cloning a `Scheduler` creates a new handle to the **same** queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                queue: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
            }),
        }
    }

    /// Queue `task` to run on a later tick.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.inner.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run the single oldest queued task, if any. Returns whether one ran.
    pub fn step(&self) -> bool {
        let task = self.inner.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run queued tasks until the queue is empty, including tasks deferred
    /// while draining. Returns the number of tasks run.
    ///
    /// Reentrant calls (from inside a running task) return 0 immediately.
    pub fn drain(&self) -> usize {
        if self.inner.draining.get() {
            return 0;
        }
        self.inner.draining.set(true);
        let mut ran = 0;
        loop {
            let task = self.inner.queue.borrow_mut().pop_front();
            let Some(task) = task else { break };
            task();
            ran += 1;
        }
        self.inner.draining.set(false);
        ran
    }

    /// Number of tasks currently queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.queue.borrow().is_empty()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("draining", &self.inner.draining.get())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
