#![forbid(unsafe_code)]

//! Resolved bindings: the engine's record of which node currently
//! satisfies a resolution request.
//!
//! A binding is observer-local state. It is mutated through a single
//! controlled point ([`Binding::set_node`], crate-private) in response to
//! the initial lookup or qualifying deferred events, and destroyed when
//! the observer detaches.
//!
//! # State machine
//!
//! `Unresolved → Resolved(node) → Resolved(node') → … → Detached`
//!
//! Entry is `Unresolved` (or directly `Resolved` when the synchronous
//! initial lookup succeeds). `Resolved → Resolved` transitions happen on
//! qualifying deferred events. `Detached` is terminal and releases all
//! subscriptions.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};
use treebind_model::NodeHandle;
use treebind_reactive::{Emitter, Subscription};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a [`Binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    /// No qualifying node has been found yet.
    Unresolved,
    /// A node is currently bound.
    Resolved,
    /// The observer detached; no further updates will be applied.
    Detached,
}

pub(crate) struct BindingInner {
    id: u64,
    name: Option<String>,
    node: RefCell<Option<NodeHandle>>,
    state: Cell<BindState>,
    rebound: Emitter<Option<NodeHandle>>,
    guards: RefCell<Vec<Subscription>>,
}

/// The engine's transient record of a resolution: `{ name?, node? }`.
///
/// Cloning a `Binding` creates a new handle to the **same** record.
/// Dropping the last handle releases all subscriptions, equivalent to
/// [`detach`](Self::detach).
#[derive(Clone)]
pub struct Binding {
    pub(crate) inner: Rc<BindingInner>,
}

impl Binding {
    pub(crate) fn new(name: Option<String>, initial: Option<NodeHandle>) -> Self {
        let state = if initial.is_some() {
            BindState::Resolved
        } else {
            BindState::Unresolved
        };
        Self {
            inner: Rc::new(BindingInner {
                id: NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed),
                name,
                node: RefCell::new(initial),
                state: Cell::new(state),
                rebound: Emitter::new(),
                guards: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<BindingInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<BindingInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn add_guard(&self, guard: Subscription) {
        self.inner.guards.borrow_mut().push(guard);
    }

    /// Unique identifier of this binding (for logs).
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The name this binding resolves, if it is name-driven.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The currently bound node, if any.
    #[must_use]
    pub fn node(&self) -> Option<NodeHandle> {
        self.inner.node.borrow().clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BindState {
        self.inner.state.get()
    }

    /// Whether a node is currently bound.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.node.borrow().is_some()
    }

    /// Subscribe to rebinds; the callback receives the newly bound node.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn on_rebind(&self, f: impl Fn(&Option<NodeHandle>) + 'static) -> Subscription {
        self.inner.rebound.subscribe(f)
    }

    /// Release all subscriptions and stop applying updates. Terminal and
    /// idempotent.
    pub fn detach(&self) {
        if self.inner.state.get() == BindState::Detached {
            return;
        }
        self.inner.state.set(BindState::Detached);
        self.inner.guards.borrow_mut().clear();
        trace!(binding = self.inner.id, "binding detached");
    }

    /// The single mutation point: bind `node`, notifying rebind
    /// subscribers.
    ///
    /// Idempotent — rebinding the identical node does nothing, so
    /// downstream subscriptions are never duplicated. Ignored once
    /// detached.
    pub(crate) fn set_node(&self, node: NodeHandle) {
        if self.inner.state.get() == BindState::Detached {
            return;
        }
        {
            let mut held = self.inner.node.borrow_mut();
            if held.as_ref() == Some(&node) {
                return;
            }
            *held = Some(node.clone());
        }
        self.inner.state.set(BindState::Resolved);
        debug!(
            binding = self.inner.id,
            name = ?self.inner.name,
            node = node.id(),
            "binding rebound"
        );
        self.inner.rebound.emit(&Some(node));
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("node", &self.inner.node.borrow().as_ref().map(NodeHandle::id))
            .field("state", &self.inner.state.get())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
