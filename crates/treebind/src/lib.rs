#![forbid(unsafe_code)]

//! Live resolution and value binding over a dynamic model tree.
//!
//! treebind keeps observers synchronized with named nodes in a mutable
//! tree of data models, even as nodes are registered, removed, or
//! replaced at runtime. Given a name (or a direct node handle) and a
//! [`Context`], the engine finds the live node, re-resolves it whenever
//! the tree structure changes, and republishes its value as a single
//! unified stream — with structural updates always delivered on a later
//! scheduler tick, never inside the emitting call.
//!
//! # Example
//!
//! ```
//! use treebind::{Context, KindMask, LeafNode, SetNode, Value, bind_value, resolve_by_name};
//!
//! let form = SetNode::new();
//! let ctx = Context::root(form.clone());
//!
//! // Resolve a name that does not exist yet.
//! let binding = resolve_by_name(&ctx, "age", KindMask::LEAF);
//! let values = bind_value(&ctx, &binding);
//! assert_eq!(values.value(), None);
//!
//! // Register it; the binding updates on the next tick.
//! let age = LeafNode::new(5);
//! form.register("age", age.clone());
//! assert_eq!(values.value(), None);
//! ctx.scheduler().drain();
//! assert_eq!(values.value(), Some(Value::Int(5)));
//!
//! // Value changes mirror synchronously.
//! age.set_value(7);
//! assert_eq!(values.value(), Some(Value::Int(7)));
//! ```

pub mod binding;
pub mod children;
pub mod context;
pub mod resolver;
pub mod value;

pub use binding::{BindState, Binding};
pub use children::{ChildrenStream, bind_children};
pub use context::Context;
pub use resolver::{
    BindingSource, resolve, resolve_by_name, resolve_node, resolve_with_fallback,
};
pub use value::{ValueStream, bind_value};

pub use treebind_model::{
    KindMask, LeafNode, ListNode, NodeHandle, NodeKind, RefNode, SetNode, Value,
};
pub use treebind_reactive::{Emitter, Observable, Scheduler, Subscription};

pub mod prelude {
    pub use treebind_model as model;
    pub use treebind_reactive as reactive;

    pub use crate::{
        BindState, Binding, ChildrenStream, Context, KindMask, ValueStream, bind_children,
        bind_value, resolve, resolve_by_name, resolve_node,
    };
}
