#![forbid(unsafe_code)]

//! Name and handle resolution against a context.
//!
//! Resolution is synchronous for the initial result, then live: the
//! resolver subscribes to the parent set's structural streams through the
//! deferred gate, filters to the resolution name, and re-queries on each
//! qualifying event. Candidates are narrowed by a [`KindMask`] before the
//! binding is updated — a name bound to the wrong kind is treated exactly
//! like an absent name.
//!
//! A removed event whose re-query yields no qualifying node leaves the
//! previously held node in place: construct-then-destroy ordering is not
//! guaranteed by the model layer, and a stale-but-present binding avoids
//! flicker during node replacement. Callers can rely on this.

use std::rc::Rc;

use tracing::trace;
use treebind_model::{KindMask, NodeHandle};
use treebind_reactive::deferred;

use crate::binding::Binding;
use crate::context::Context;

/// What a resolution starts from: a name to look up, or a node supplied
/// directly.
#[derive(Debug, Clone)]
pub enum BindingSource {
    Name(String),
    Node(NodeHandle),
}

impl From<&str> for BindingSource {
    fn from(name: &str) -> Self {
        BindingSource::Name(name.to_string())
    }
}

impl From<String> for BindingSource {
    fn from(name: String) -> Self {
        BindingSource::Name(name)
    }
}

impl From<NodeHandle> for BindingSource {
    fn from(node: NodeHandle) -> Self {
        BindingSource::Node(node)
    }
}

impl From<&NodeHandle> for BindingSource {
    fn from(node: &NodeHandle) -> Self {
        BindingSource::Node(node.clone())
    }
}

/// Resolve `source` within `ctx`, narrowing candidates to `kinds`.
///
/// Name sources stay live (see [`resolve_by_name`]); node sources are
/// fixed (see [`resolve_node`]).
pub fn resolve(ctx: &Context, source: impl Into<BindingSource>, kinds: KindMask) -> Binding {
    match source.into() {
        BindingSource::Name(name) => resolve_by_name(ctx, &name, kinds),
        BindingSource::Node(node) => resolve_node(node, kinds),
    }
}

/// Resolve `name` within `ctx`, narrowing candidates to `kinds`.
///
/// The initial result comes from a synchronous lookup; afterwards the
/// binding follows qualifying registered/removed events for `name`,
/// delivered on later scheduler ticks.
pub fn resolve_by_name(ctx: &Context, name: &str, kinds: KindMask) -> Binding {
    resolve_with_fallback(ctx, name, None, kinds)
}

/// Resolve a directly supplied node.
///
/// The binding is fixed for the observer's lifetime: no structural
/// subscriptions are created. A node of the wrong kind leaves the binding
/// unresolved.
pub fn resolve_node(node: NodeHandle, kinds: KindMask) -> Binding {
    let initial = kinds.accepts(&node).then_some(node);
    let binding = Binding::new(None, initial);
    trace!(
        binding = binding.id(),
        resolved = binding.is_resolved(),
        "resolved direct node"
    );
    binding
}

/// Resolve `name` within `ctx` with a directly supplied fallback.
///
/// The synchronous lookup takes precedence; if it does not yield a
/// qualifying node, a qualifying `fallback` is bound instead. Either way
/// the binding keeps following qualifying events for `name`, so a node
/// registered later under that name supersedes the fallback.
pub fn resolve_with_fallback(
    ctx: &Context,
    name: &str,
    fallback: Option<&NodeHandle>,
    kinds: KindMask,
) -> Binding {
    let parent = ctx.parent();
    let initial = parent
        .get(name)
        .filter(|candidate| kinds.accepts(candidate))
        .or_else(|| {
            fallback
                .filter(|candidate| kinds.accepts(candidate))
                .cloned()
        });
    let binding = Binding::new(Some(name.to_string()), initial);
    trace!(
        binding = binding.id(),
        name,
        resolved = binding.is_resolved(),
        "initial resolution"
    );

    // Merged registered+removed subscription, delivered on a later tick.
    // Both events re-query; the binding only moves when the candidate
    // qualifies, so removal without a replacement retains the stale node.
    let requery = {
        let weak = binding.downgrade();
        let parent = parent.clone();
        let target: Rc<str> = Rc::from(name);
        Rc::new(move |event: &String| {
            if event.as_str() != &*target {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Some(candidate) = parent.get(&target) else {
                trace!(name = &*target, "no candidate after removal; binding retained");
                return;
            };
            if kinds.accepts(&candidate) {
                Binding::from_inner(inner).set_node(candidate);
            }
        })
    };

    let on_registered = Rc::clone(&requery);
    binding.add_guard(deferred(
        ctx.scheduler(),
        parent.child_registered(),
        move |event: &String| on_registered(event),
    ));
    let on_removed = requery;
    binding.add_guard(deferred(
        ctx.scheduler(),
        parent.child_removed(),
        move |event: &String| on_removed(event),
    ));

    binding
}

// ─── Tests ───────────────────────────────────────────────────────────────────
