#![forbid(unsafe_code)]

//! Unified value streams over resolved bindings.
//!
//! [`bind_value`] republishes whatever the binding currently points at as
//! a single `Option<Value>` cell:
//!
//! - unresolved binding → `None`;
//! - plain leaf → the leaf's value, mirrored synchronously;
//! - indirect reference → a switching subscription that follows the
//!   reference's target stream through the deferred gate, with at most one
//!   underlying value subscription active at any time;
//! - set or list node → `None` (no scalar value to republish).
//!
//! When the resolver rebinds, the previous adapter subscription is torn
//! down entirely before the new one is established. When a reference
//! switches targets, the old target is silenced before the new one is
//! followed — nothing from the old target is delivered after the switch
//! decision.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;
use treebind_model::{LeafNode, NodeHandle, Value};
use treebind_reactive::{Observable, Scheduler, Subscription, deferred};

use crate::binding::Binding;
use crate::context::Context;

struct ValueStreamInner {
    out: Observable<Option<Value>>,
    scheduler: Scheduler,
    /// Subscription to the followed leaf's change stream.
    value_sub: RefCell<Option<Subscription>>,
    /// Subscription to an indirect reference's target stream.
    target_sub: RefCell<Option<Subscription>>,
    /// Last target delivered through the gate; `None` until the first
    /// delivery after an attach.
    delivered_target: RefCell<Option<Option<NodeHandle>>>,
    rebind_sub: RefCell<Option<Subscription>>,
    detached: Cell<bool>,
}

impl ValueStreamInner {
    fn attach(inner: &Rc<Self>, node: Option<NodeHandle>) {
        if inner.detached.get() {
            return;
        }
        // Tear the previous adapter subscription down entirely before
        // establishing a new one.
        inner.value_sub.borrow_mut().take();
        inner.target_sub.borrow_mut().take();
        inner.delivered_target.borrow_mut().take();

        match node {
            None => inner.out.set(None),
            Some(NodeHandle::Leaf(leaf)) => Self::follow_leaf(inner, &leaf),
            Some(NodeHandle::Ref(reference)) => {
                // Replay the current target on the next tick, then follow
                // target changes through the gate.
                let initial = reference.target();
                let weak = Rc::downgrade(inner);
                inner.scheduler.defer(move || {
                    if let Some(inner) = weak.upgrade() {
                        Self::switch_target(&inner, initial);
                    }
                });
                let weak = Rc::downgrade(inner);
                let sub = deferred(
                    &inner.scheduler,
                    reference.target_cell(),
                    move |target: &Option<NodeHandle>| {
                        if let Some(inner) = weak.upgrade() {
                            Self::switch_target(&inner, target.clone());
                        }
                    },
                );
                *inner.target_sub.borrow_mut() = Some(sub);
            }
            // Sets and lists carry no scalar value.
            Some(_) => inner.out.set(None),
        }
    }

    fn follow_leaf(inner: &Rc<Self>, leaf: &LeafNode) {
        inner.out.set(Some(leaf.value()));
        let weak = Rc::downgrade(inner);
        let sub = leaf.on_change(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.out.set(Some(value.clone()));
            }
        });
        *inner.value_sub.borrow_mut() = Some(sub);
    }

    fn switch_target(inner: &Rc<Self>, target: Option<NodeHandle>) {
        if inner.detached.get() {
            return;
        }
        if inner.delivered_target.borrow().as_ref() == Some(&target) {
            return;
        }
        // Silence the old target before anything from the new one flows.
        inner.value_sub.borrow_mut().take();
        *inner.delivered_target.borrow_mut() = Some(target.clone());
        trace!(target = ?target.as_ref().map(NodeHandle::id), "reference target switched");

        match target {
            Some(NodeHandle::Leaf(leaf)) => Self::follow_leaf(inner, &leaf),
            _ => inner.out.set(None),
        }
    }

    fn detach(&self) {
        if self.detached.get() {
            return;
        }
        self.detached.set(true);
        self.value_sub.borrow_mut().take();
        self.target_sub.borrow_mut().take();
        self.rebind_sub.borrow_mut().take();
        self.delivered_target.borrow_mut().take();
    }
}

/// The unified value stream for one observer's binding.
///
/// Dropping the stream tears down every subscription it holds.
pub struct ValueStream {
    inner: Rc<ValueStreamInner>,
}

impl ValueStream {
    /// The current unified value.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        self.inner.out.get()
    }

    /// Subscribe to unified value changes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, f: impl Fn(&Option<Value>) + 'static) -> Subscription {
        self.inner.out.subscribe(f)
    }

    /// Change counter of the unified value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.out.version()
    }

    /// Stop mirroring and release every held subscription. Terminal and
    /// idempotent; the last value is retained.
    pub fn detach(&self) {
        self.inner.detach();
    }
}

impl std::fmt::Debug for ValueStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStream")
            .field("value", &self.inner.out.get())
            .field("detached", &self.inner.detached.get())
            .finish()
    }
}

/// Mirror `binding`'s current node as a unified value stream, following
/// rebinds for the stream's lifetime.
#[must_use]
pub fn bind_value(ctx: &Context, binding: &Binding) -> ValueStream {
    let inner = Rc::new(ValueStreamInner {
        out: Observable::new(None),
        scheduler: ctx.scheduler().clone(),
        value_sub: RefCell::new(None),
        target_sub: RefCell::new(None),
        delivered_target: RefCell::new(None),
        rebind_sub: RefCell::new(None),
        detached: Cell::new(false),
    });
    ValueStreamInner::attach(&inner, binding.node());

    let weak = Rc::downgrade(&inner);
    let rebind = binding.on_rebind(move |node: &Option<NodeHandle>| {
        if let Some(inner) = weak.upgrade() {
            ValueStreamInner::attach(&inner, node.clone());
        }
    });
    *inner.rebind_sub.borrow_mut() = Some(rebind);

    ValueStream { inner }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
