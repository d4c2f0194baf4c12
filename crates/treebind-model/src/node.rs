#![forbid(unsafe_code)]

//! Tree nodes: named sets, value leaves, ordered lists, and indirect
//! references.
//!
//! Every node type is a cheap-clone handle (`Rc` inside); clones share the
//! node. The tree owns its children through the set/list containers; the
//! engine only ever holds non-owning handles plus subscriptions.
//!
//! Structural mutation is infallible: registering over an existing name
//! replaces it (emitting a registered event), removing a missing name does
//! nothing.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use treebind_reactive::{Emitter, Observable, Subscription};

use crate::value::Value;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

// ─── SetNode ─────────────────────────────────────────────────────────────────

struct SetInner {
    id: u64,
    children: RefCell<AHashMap<String, NodeHandle>>,
    child_registered: Emitter<String>,
    child_removed: Emitter<String>,
}

/// A node containing named children, with structural change streams.
///
/// `get(name)` after a registered event for `name` returns the new child
/// until a subsequent removed event for the same name.
#[derive(Clone)]
pub struct SetNode {
    inner: Rc<SetInner>,
}

impl Default for SetNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SetNode {
    /// Create an empty set node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SetInner {
                id: next_node_id(),
                children: RefCell::new(AHashMap::new()),
                child_registered: Emitter::new(),
                child_removed: Emitter::new(),
            }),
        }
    }

    /// Unique identifier of this node.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Look up a child by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<NodeHandle> {
        self.inner.children.borrow().get(name).cloned()
    }

    /// Register `node` under `name`, replacing any existing child, and
    /// emit a registered event carrying the name.
    pub fn register(&self, name: impl Into<String>, node: impl Into<NodeHandle>) {
        let name = name.into();
        self.inner
            .children
            .borrow_mut()
            .insert(name.clone(), node.into());
        self.inner.child_registered.emit(&name);
    }

    /// Remove the child under `name`, emitting a removed event if one was
    /// present. Returns the removed child.
    pub fn remove(&self, name: &str) -> Option<NodeHandle> {
        let removed = self.inner.children.borrow_mut().remove(name);
        if removed.is_some() {
            self.inner.child_removed.emit(&name.to_owned());
        }
        removed
    }

    /// Whether a child is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.children.borrow().contains_key(name)
    }

    /// Number of registered children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Whether the set has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.children.borrow().is_empty()
    }

    /// Stream of child names as they are registered.
    #[must_use]
    pub fn child_registered(&self) -> &Emitter<String> {
        &self.inner.child_registered
    }

    /// Stream of child names as they are removed.
    #[must_use]
    pub fn child_removed(&self) -> &Emitter<String> {
        &self.inner.child_removed
    }

    /// Wrap this node in a [`NodeHandle`].
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        NodeHandle::Set(self.clone())
    }
}

impl PartialEq for SetNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for SetNode {}

impl std::fmt::Debug for SetNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetNode")
            .field("id", &self.inner.id)
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

// ─── LeafNode ────────────────────────────────────────────────────────────────

struct LeafInner {
    id: u64,
    value: Observable<Value>,
}

/// A node holding a single current value with a change stream.
#[derive(Clone)]
pub struct LeafNode {
    inner: Rc<LeafInner>,
}

impl LeafNode {
    /// Create a leaf holding `value`.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            inner: Rc::new(LeafInner {
                id: next_node_id(),
                value: Observable::new(value.into()),
            }),
        }
    }

    /// Unique identifier of this node.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Clone out the current value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.value.get()
    }

    /// Access the current value by reference.
    pub fn with_value<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.inner.value.with(f)
    }

    /// Replace the value. Equal values do not notify.
    pub fn set_value(&self, value: impl Into<Value>) {
        self.inner.value.set(value.into());
    }

    /// Subscribe to value changes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn on_change(&self, f: impl Fn(&Value) + 'static) -> Subscription {
        self.inner.value.subscribe(f)
    }

    /// The underlying value cell.
    #[must_use]
    pub fn value_cell(&self) -> &Observable<Value> {
        &self.inner.value
    }

    /// Wrap this node in a [`NodeHandle`].
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        NodeHandle::Leaf(self.clone())
    }
}

impl PartialEq for LeafNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for LeafNode {}

impl std::fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafNode")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.get())
            .finish()
    }
}

// ─── ListNode ────────────────────────────────────────────────────────────────

struct ListInner {
    id: u64,
    children: RefCell<Vec<NodeHandle>>,
    changed: Emitter<Vec<NodeHandle>>,
}

/// A node holding an ordered, dynamically changing sequence of children.
///
/// The change stream emits the full current sequence on every membership
/// or order change.
#[derive(Clone)]
pub struct ListNode {
    inner: Rc<ListInner>,
}

impl Default for ListNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ListNode {
    /// Create an empty list node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ListInner {
                id: next_node_id(),
                children: RefCell::new(Vec::new()),
                changed: Emitter::new(),
            }),
        }
    }

    /// Unique identifier of this node.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Snapshot of the current children, in order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeHandle> {
        self.inner.children.borrow().clone()
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Whether the list has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.children.borrow().is_empty()
    }

    /// Append a child, emitting the new sequence.
    pub fn push(&self, node: impl Into<NodeHandle>) {
        self.inner.children.borrow_mut().push(node.into());
        self.emit_snapshot();
    }

    /// Insert a child at `index` (clamped to the end), emitting the new
    /// sequence.
    pub fn insert(&self, index: usize, node: impl Into<NodeHandle>) {
        {
            let mut children = self.inner.children.borrow_mut();
            let index = index.min(children.len());
            children.insert(index, node.into());
        }
        self.emit_snapshot();
    }

    /// Remove and return the child at `index`, emitting the new sequence.
    /// Out-of-bounds indices do nothing.
    pub fn remove(&self, index: usize) -> Option<NodeHandle> {
        let removed = {
            let mut children = self.inner.children.borrow_mut();
            if index < children.len() {
                Some(children.remove(index))
            } else {
                None
            }
        };
        if removed.is_some() {
            self.emit_snapshot();
        }
        removed
    }

    /// Subscribe to sequence changes; the callback receives the full
    /// current sequence.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn on_children_change(&self, f: impl Fn(&Vec<NodeHandle>) + 'static) -> Subscription {
        self.inner.changed.subscribe(f)
    }

    /// Wrap this node in a [`NodeHandle`].
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        NodeHandle::List(self.clone())
    }

    fn emit_snapshot(&self) {
        let snapshot = self.inner.children.borrow().clone();
        self.inner.changed.emit(&snapshot);
    }
}

impl PartialEq for ListNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ListNode {}

impl std::fmt::Debug for ListNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListNode")
            .field("id", &self.inner.id)
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

// ─── RefNode ─────────────────────────────────────────────────────────────────

struct RefInner {
    id: u64,
    target: Observable<Option<NodeHandle>>,
}

/// An indirect reference: a node-valued cell whose target can itself
/// change over time.
#[derive(Clone)]
pub struct RefNode {
    inner: Rc<RefInner>,
}

impl Default for RefNode {
    fn default() -> Self {
        Self::new()
    }
}

impl RefNode {
    /// Create a reference with no target.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefInner {
                id: next_node_id(),
                target: Observable::new(None),
            }),
        }
    }

    /// Create a reference pointing at `target`.
    #[must_use]
    pub fn with_target(target: impl Into<NodeHandle>) -> Self {
        let node = Self::new();
        node.set_target(Some(target.into()));
        node
    }

    /// Unique identifier of this node.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The current target, if any.
    #[must_use]
    pub fn target(&self) -> Option<NodeHandle> {
        self.inner.target.get()
    }

    /// Repoint the reference. Setting the identical target does not
    /// notify.
    pub fn set_target(&self, target: Option<NodeHandle>) {
        self.inner.target.set(target);
    }

    /// Subscribe to target changes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn on_target_change(
        &self,
        f: impl Fn(&Option<NodeHandle>) + 'static,
    ) -> Subscription {
        self.inner.target.subscribe(f)
    }

    /// The underlying target cell.
    #[must_use]
    pub fn target_cell(&self) -> &Observable<Option<NodeHandle>> {
        &self.inner.target
    }

    /// Wrap this node in a [`NodeHandle`].
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        NodeHandle::Ref(self.clone())
    }
}

impl PartialEq for RefNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RefNode {}

impl std::fmt::Debug for RefNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefNode")
            .field("id", &self.inner.id)
            .field("target", &self.inner.target.with(|t| t.as_ref().map(NodeHandle::id)))
            .finish()
    }
}

// ─── NodeHandle ──────────────────────────────────────────────────────────────

/// A non-owning handle to any node in the tree.
///
/// Equality is identity: two handles are equal when they refer to the same
/// node.
#[derive(Clone)]
pub enum NodeHandle {
    Set(SetNode),
    Leaf(LeafNode),
    List(ListNode),
    Ref(RefNode),
}

impl NodeHandle {
    /// Unique identifier of the underlying node.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            NodeHandle::Set(n) => n.id(),
            NodeHandle::Leaf(n) => n.id(),
            NodeHandle::List(n) => n.id(),
            NodeHandle::Ref(n) => n.id(),
        }
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for NodeHandle {}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeHandle::Set(n) => n.fmt(f),
            NodeHandle::Leaf(n) => n.fmt(f),
            NodeHandle::List(n) => n.fmt(f),
            NodeHandle::Ref(n) => n.fmt(f),
        }
    }
}

impl From<SetNode> for NodeHandle {
    fn from(node: SetNode) -> Self {
        NodeHandle::Set(node)
    }
}

impl From<LeafNode> for NodeHandle {
    fn from(node: LeafNode) -> Self {
        NodeHandle::Leaf(node)
    }
}

impl From<ListNode> for NodeHandle {
    fn from(node: ListNode) -> Self {
        NodeHandle::List(node)
    }
}

impl From<RefNode> for NodeHandle {
    fn from(node: RefNode) -> Self {
        NodeHandle::Ref(node)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
