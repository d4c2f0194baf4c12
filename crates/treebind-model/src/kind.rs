#![forbid(unsafe_code)]

//! Capability classification of node handles.
//!
//! Lookups by name return untyped handles, so every cross-boundary result
//! is narrowed here before use: pure, total predicates plus `as_*`
//! accessors, and a [`KindMask`] for callers that accept more than one
//! kind.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::node::{LeafNode, ListNode, NodeHandle, RefNode, SetNode};

/// The four node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    Set,
    Leaf,
    List,
    Ref,
}

bitflags! {
    /// A set of acceptable node kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KindMask: u8 {
        const SET = 1;
        const LEAF = 1 << 1;
        const LIST = 1 << 2;
        const REF = 1 << 3;
        /// Kinds a unified value stream can draw from: plain leaves and
        /// indirect references to leaves.
        const VALUE_SOURCES = Self::LEAF.bits() | Self::REF.bits();
    }
}

impl From<NodeKind> for KindMask {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Set => KindMask::SET,
            NodeKind::Leaf => KindMask::LEAF,
            NodeKind::List => KindMask::LIST,
            NodeKind::Ref => KindMask::REF,
        }
    }
}

impl KindMask {
    /// Whether `node`'s kind is in this mask.
    #[must_use]
    pub fn accepts(&self, node: &NodeHandle) -> bool {
        self.contains(KindMask::from(node.kind()))
    }
}

impl NodeHandle {
    /// The kind of the underlying node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeHandle::Set(_) => NodeKind::Set,
            NodeHandle::Leaf(_) => NodeKind::Leaf,
            NodeHandle::List(_) => NodeKind::List,
            NodeHandle::Ref(_) => NodeKind::Ref,
        }
    }

    /// Whether this is a set node.
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, NodeHandle::Set(_))
    }

    /// Whether this is a leaf node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeHandle::Leaf(_))
    }

    /// Whether this is a list node.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, NodeHandle::List(_))
    }

    /// Whether this is an indirect reference.
    #[must_use]
    pub fn is_ref(&self) -> bool {
        matches!(self, NodeHandle::Ref(_))
    }

    /// Narrow to a set node.
    #[must_use]
    pub fn as_set(&self) -> Option<&SetNode> {
        match self {
            NodeHandle::Set(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to a leaf node.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            NodeHandle::Leaf(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to a list node.
    #[must_use]
    pub fn as_list(&self) -> Option<&ListNode> {
        match self {
            NodeHandle::List(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to an indirect reference.
    #[must_use]
    pub fn as_ref_node(&self) -> Option<&RefNode> {
        match self {
            NodeHandle::Ref(n) => Some(n),
            _ => None,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn one_of_each() -> [NodeHandle; 4] {
        [
            SetNode::new().handle(),
            LeafNode::new(0).handle(),
            ListNode::new().handle(),
            RefNode::new().handle(),
        ]
    }

    #[test]
    fn kind_matches_variant() {
        let [set, leaf, list, reference] = one_of_each();
        assert_eq!(set.kind(), NodeKind::Set);
        assert_eq!(leaf.kind(), NodeKind::Leaf);
        assert_eq!(list.kind(), NodeKind::List);
        assert_eq!(reference.kind(), NodeKind::Ref);
    }

    #[test]
    fn predicates_are_exclusive() {
        for node in one_of_each() {
            let hits = [node.is_set(), node.is_leaf(), node.is_list(), node.is_ref()]
                .iter()
                .filter(|&&hit| hit)
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn narrowing_accessors_agree_with_predicates() {
        let [set, leaf, list, reference] = one_of_each();
        assert!(set.as_set().is_some());
        assert!(set.as_leaf().is_none());
        assert!(leaf.as_leaf().is_some());
        assert!(list.as_list().is_some());
        assert!(reference.as_ref_node().is_some());
        assert!(reference.as_leaf().is_none());
    }

    #[test]
    fn mask_accepts_by_kind() {
        let [set, leaf, list, reference] = one_of_each();
        assert!(KindMask::SET.accepts(&set));
        assert!(!KindMask::SET.accepts(&leaf));
        assert!(KindMask::LEAF.accepts(&leaf));
        assert!(KindMask::VALUE_SOURCES.accepts(&leaf));
        assert!(KindMask::VALUE_SOURCES.accepts(&reference));
        assert!(!KindMask::VALUE_SOURCES.accepts(&set));
        assert!(!KindMask::VALUE_SOURCES.accepts(&list));
        assert!(KindMask::all().accepts(&list));
        assert!(!KindMask::empty().accepts(&list));
    }
}
