#![forbid(unsafe_code)]

//! Child-sequence streams over resolved list bindings.
//!
//! The list counterpart of [`bind_value`](crate::value::bind_value):
//! mirrors the bound list node's sequence stream directly and follows
//! rebinds. Non-list or unresolved bindings yield `None`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use treebind_model::{ListNode, NodeHandle};
use treebind_reactive::{Observable, Subscription};

use crate::binding::Binding;

struct ChildrenStreamInner {
    out: Observable<Option<Vec<NodeHandle>>>,
    list_sub: RefCell<Option<Subscription>>,
    rebind_sub: RefCell<Option<Subscription>>,
    detached: Cell<bool>,
}

impl ChildrenStreamInner {
    fn attach(inner: &Rc<Self>, node: Option<NodeHandle>) {
        if inner.detached.get() {
            return;
        }
        inner.list_sub.borrow_mut().take();
        match node {
            Some(NodeHandle::List(list)) => Self::follow_list(inner, &list),
            _ => inner.out.set(None),
        }
    }

    fn follow_list(inner: &Rc<Self>, list: &ListNode) {
        inner.out.set(Some(list.children()));
        let weak = Rc::downgrade(inner);
        let sub = list.on_children_change(move |children| {
            if let Some(inner) = weak.upgrade() {
                inner.out.set(Some(children.clone()));
            }
        });
        *inner.list_sub.borrow_mut() = Some(sub);
    }
}

/// The unified child-sequence stream for one observer's binding.
///
/// Dropping the stream tears down every subscription it holds.
pub struct ChildrenStream {
    inner: Rc<ChildrenStreamInner>,
}

impl ChildrenStream {
    /// The current child sequence, if a list is bound.
    #[must_use]
    pub fn children(&self) -> Option<Vec<NodeHandle>> {
        self.inner.out.get()
    }

    /// Subscribe to sequence changes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(
        &self,
        f: impl Fn(&Option<Vec<NodeHandle>>) + 'static,
    ) -> Subscription {
        self.inner.out.subscribe(f)
    }

    /// Stop mirroring and release every held subscription. Terminal and
    /// idempotent; the last sequence is retained.
    pub fn detach(&self) {
        if self.inner.detached.get() {
            return;
        }
        self.inner.detached.set(true);
        self.inner.list_sub.borrow_mut().take();
        self.inner.rebind_sub.borrow_mut().take();
    }
}

impl std::fmt::Debug for ChildrenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildrenStream")
            .field(
                "children",
                &self.inner.out.with(|c| c.as_ref().map(Vec::len)),
            )
            .field("detached", &self.inner.detached.get())
            .finish()
    }
}

/// Mirror `binding`'s current list node as a child-sequence stream,
/// following rebinds for the stream's lifetime.
#[must_use]
pub fn bind_children(binding: &Binding) -> ChildrenStream {
    let inner = Rc::new(ChildrenStreamInner {
        out: Observable::new(None),
        list_sub: RefCell::new(None),
        rebind_sub: RefCell::new(None),
        detached: Cell::new(false),
    });
    ChildrenStreamInner::attach(&inner, binding.node());

    let weak = Rc::downgrade(&inner);
    let rebind = binding.on_rebind(move |node: &Option<NodeHandle>| {
        if let Some(inner) = weak.upgrade() {
            ChildrenStreamInner::attach(&inner, node.clone());
        }
    });
    *inner.rebind_sub.borrow_mut() = Some(rebind);

    ChildrenStream { inner }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::resolver::resolve_by_name;
    use treebind_model::{KindMask, LeafNode, SetNode};

    #[test]
    fn unresolved_binding_yields_none() {
        let ctx = Context::root(SetNode::new());
        let binding = resolve_by_name(&ctx, "items", KindMask::LIST);
        let stream = bind_children(&binding);
        assert!(stream.children().is_none());
    }

    #[test]
    fn list_binding_mirrors_the_sequence() {
        let set = SetNode::new();
        let list = ListNode::new();
        set.register("items", list.clone());
        let ctx = Context::root(set);

        let binding = resolve_by_name(&ctx, "items", KindMask::LIST);
        let stream = bind_children(&binding);
        assert_eq!(stream.children(), Some(Vec::new()));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = stream.subscribe(move |c: &Option<Vec<NodeHandle>>| {
            s.borrow_mut().push(c.as_ref().map(Vec::len));
        });

        let a = LeafNode::new(1);
        list.push(a.clone());
        list.push(LeafNode::new(2));
        assert_eq!(*seen.borrow(), vec![Some(1), Some(2)]);
        assert_eq!(
            stream.children().map(|c| c[0].clone()),
            Some(a.handle())
        );
    }

    #[test]
    fn list_registered_later_arrives_through_rebind() {
        let set = SetNode::new();
        let ctx = Context::root(set.clone());

        let binding = resolve_by_name(&ctx, "items", KindMask::LIST);
        let stream = bind_children(&binding);
        assert!(stream.children().is_none());

        let list = ListNode::new();
        list.push(LeafNode::new(1));
        set.register("items", list);
        ctx.scheduler().drain();
        assert_eq!(stream.children().map(|c| c.len()), Some(1));
    }

    #[test]
    fn detach_stops_mirroring() {
        let set = SetNode::new();
        let list = ListNode::new();
        set.register("items", list.clone());
        let ctx = Context::root(set);

        let binding = resolve_by_name(&ctx, "items", KindMask::LIST);
        let stream = bind_children(&binding);
        stream.detach();
        stream.detach();

        list.push(LeafNode::new(1));
        assert_eq!(stream.children(), Some(Vec::new()));
    }
}
