#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use treebind::{
    Context, KindMask, LeafNode, NodeHandle, SetNode, bind_value, resolve_by_name,
};

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    RegisterLeaf { name: u8, value: i64 },
    RegisterSet { name: u8 },
    Remove { name: u8 },
    SetValue { name: u8, value: i64 },
    Step,
    Drain,
}

fn name_of(tag: u8) -> String {
    // Small name space so operations collide with the watched name often.
    format!("n{}", tag % 4)
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let set = SetNode::new();
    let ctx = Context::root(set.clone());

    let binding = resolve_by_name(&ctx, "n0", KindMask::LEAF);
    let values = bind_value(&ctx, &binding);

    for op in ops {
        match op {
            FuzzOp::RegisterLeaf { name, value } => {
                set.register(name_of(name), LeafNode::new(value));
            }
            FuzzOp::RegisterSet { name } => {
                set.register(name_of(name), SetNode::new());
            }
            FuzzOp::Remove { name } => {
                set.remove(&name_of(name));
            }
            FuzzOp::SetValue { name, value } => {
                if let Some(leaf) = set.get(&name_of(name)).as_ref().and_then(NodeHandle::as_leaf)
                {
                    leaf.set_value(value);
                }
            }
            FuzzOp::Step => {
                ctx.scheduler().step();
            }
            FuzzOp::Drain => {
                ctx.scheduler().drain();
            }
        }

        // A leaf-kinded binding must never hold a non-leaf node, and the
        // unified stream must always mirror the bound leaf's value.
        let bound = binding.node();
        if let Some(node) = &bound {
            assert!(node.is_leaf());
        }
        let mirrored = bound.as_ref().and_then(NodeHandle::as_leaf).map(LeafNode::value);
        assert_eq!(values.value(), mirrored);
    }

    ctx.scheduler().drain();
    if let Some(candidate) = set.get("n0") {
        if candidate.is_leaf() {
            // At quiescence a qualifying candidate must be the bound node.
            assert_eq!(binding.node(), Some(candidate));
        }
    }
});
