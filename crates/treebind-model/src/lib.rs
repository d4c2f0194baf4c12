#![forbid(unsafe_code)]

//! The treebind model tree.
//!
//! A dynamic, mutable tree of named data nodes: sets hold named children
//! and emit structural change events, leaves hold values with change
//! streams, lists hold ordered child sequences, and indirect references
//! point at targets that can themselves change. The resolution engine in
//! the `treebind` crate consumes this contract; it never mutates the tree.

pub mod kind;
pub mod node;
pub mod value;

pub use kind::{KindMask, NodeKind};
pub use node::{LeafNode, ListNode, NodeHandle, RefNode, SetNode};
pub use value::Value;
