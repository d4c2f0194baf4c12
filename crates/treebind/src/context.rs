#![forbid(unsafe_code)]

//! Resolution contexts.
//!
//! A [`Context`] names the set node that name lookups are relative to,
//! plus the ambient machinery every resolution shares (the scheduler).
//! Contexts are immutable: entering a nested set derives a new context
//! that clones the ambient fields and replaces only the parent.
//!
//! Derivation is memoized so that repeated derivation with the same set
//! node is reference-stable — dependent subscriptions are not torn down
//! and rebuilt spuriously on every evaluation.

use std::cell::RefCell;
use std::rc::Rc;

use treebind_model::SetNode;
use treebind_reactive::Scheduler;

use crate::binding::Binding;

struct ContextInner {
    parent: SetNode,
    scheduler: Scheduler,
    /// Most recent derivation: (set id, derived context).
    derived: RefCell<Option<(u64, Context)>>,
}

/// An immutable resolution context.
///
/// Cloning a `Context` creates a new handle to the **same** context;
/// [`derive`](Self::derive) is what produces a different one.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl Context {
    /// Create a context resolving against `parent`, driven by `scheduler`.
    #[must_use]
    pub fn new(scheduler: Scheduler, parent: SetNode) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                parent,
                scheduler,
                derived: RefCell::new(None),
            }),
        }
    }

    /// Create a root context with its own fresh scheduler.
    #[must_use]
    pub fn root(parent: SetNode) -> Self {
        Self::new(Scheduler::new(), parent)
    }

    /// The set node name lookups are relative to.
    #[must_use]
    pub fn parent(&self) -> &SetNode {
        &self.inner.parent
    }

    /// The scheduler deferred events are delivered on.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Derive a context identical to this one except that lookups are
    /// relative to `parent`.
    ///
    /// Memoized: deriving again with the same set node returns the same
    /// context (reference-equal). Deriving with a different set replaces
    /// the memo slot.
    #[must_use]
    pub fn derive(&self, parent: &SetNode) -> Context {
        if let Some((id, derived)) = &*self.inner.derived.borrow() {
            if *id == parent.id() {
                return derived.clone();
            }
        }
        let derived = Context::new(self.inner.scheduler.clone(), parent.clone());
        *self.inner.derived.borrow_mut() = Some((parent.id(), derived.clone()));
        derived
    }

    /// Derive a context for resolving inside `binding`'s current node, if
    /// that node is a set. Memoization makes the result stable while the
    /// binding keeps resolving to the same set.
    #[must_use]
    pub fn enter(&self, binding: &Binding) -> Option<Context> {
        let node = binding.node()?;
        let set = node.as_set()?.clone();
        Some(self.derive(&set))
    }

    /// Whether two handles refer to the same context.
    #[must_use]
    pub fn ptr_eq(a: &Context, b: &Context) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("parent", &self.inner.parent.id())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_by_name;
    use treebind_model::{KindMask, LeafNode};

    #[test]
    fn derive_replaces_only_the_parent() {
        let root = SetNode::new();
        let nested = SetNode::new();
        let ctx = Context::root(root.clone());

        let child = ctx.derive(&nested);
        assert_eq!(child.parent(), &nested);
        assert_eq!(ctx.parent(), &root);
        // Ambient scheduler is shared, not cloned into a new queue.
        child.scheduler().defer(|| {});
        assert_eq!(ctx.scheduler().pending(), 1);
        ctx.scheduler().drain();
    }

    #[test]
    fn derive_is_memoized_for_identical_inputs() {
        let ctx = Context::root(SetNode::new());
        let nested = SetNode::new();

        let first = ctx.derive(&nested);
        let second = ctx.derive(&nested);
        assert!(Context::ptr_eq(&first, &second));
    }

    #[test]
    fn derive_with_different_set_is_a_new_context() {
        let ctx = Context::root(SetNode::new());
        let a = SetNode::new();
        let b = SetNode::new();

        let first = ctx.derive(&a);
        let second = ctx.derive(&b);
        assert!(!Context::ptr_eq(&first, &second));
        assert_eq!(second.parent(), &b);
    }

    #[test]
    fn enter_requires_a_resolved_set() {
        let root = SetNode::new();
        let ctx = Context::root(root.clone());

        let unresolved = resolve_by_name(&ctx, "missing", KindMask::SET);
        assert!(ctx.enter(&unresolved).is_none());

        root.register("leaf", LeafNode::new(1));
        let wrong_kind = resolve_by_name(&ctx, "leaf", KindMask::all());
        assert!(ctx.enter(&wrong_kind).is_none());

        let nested = SetNode::new();
        root.register("nested", nested.clone());
        let set_binding = resolve_by_name(&ctx, "nested", KindMask::SET);
        let entered = ctx.enter(&set_binding).expect("set binding enters");
        assert_eq!(entered.parent(), &nested);

        // Stable across repeated entry while the binding is unchanged.
        let again = ctx.enter(&set_binding).expect("set binding enters");
        assert!(Context::ptr_eq(&entered, &again));
    }
}
