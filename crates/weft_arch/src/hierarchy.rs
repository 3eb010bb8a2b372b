//! The block instancing hierarchy as a directed graph.
//!
//! Nodes are blocks and primitives; an edge `parent -> element` exists for
//! every instance. Composition keeps the graph acyclic, so it always has a
//! topological order.

use crate::block::ElementRef;
use crate::context::ArchitectureContext;
use crate::error::ArchError;
use crate::ids::{BlockId, PrimitiveId};
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};

/// The instancing graph of a context.
pub struct Hierarchy {
    graph: DiGraph<ElementRef, ()>,
    nodes: HashMap<ElementRef, NodeIndex>,
}

impl Hierarchy {
    /// Builds the graph from the current blocks.
    pub fn build(ctx: &ArchitectureContext) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for (id, _) in ctx.library.iter() {
            let element = ElementRef::Primitive(id);
            nodes.insert(element, graph.add_node(element));
        }
        for id in ctx.blocks.ids() {
            let element = ElementRef::Block(id);
            nodes.insert(element, graph.add_node(element));
        }
        for block in ctx.blocks() {
            let parent = nodes[&ElementRef::Block(block.id)];
            for inst in block.instances() {
                if let Some(&child) = nodes.get(&inst.element) {
                    graph.add_edge(parent, child, ());
                }
            }
        }
        Self { graph, nodes }
    }

    /// Returns `true` if instancing `child` inside `parent` would close a cycle.
    pub fn would_cycle(&self, parent: BlockId, child: BlockId) -> bool {
        if parent == child {
            return true;
        }
        match (
            self.nodes.get(&ElementRef::Block(child)),
            self.nodes.get(&ElementRef::Block(parent)),
        ) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Returns blocks ordered so that every block comes after the blocks it
    /// instantiates.
    pub fn blocks_bottom_up(&self, ctx: &ArchitectureContext) -> Result<Vec<BlockId>, ArchError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let name = match self.graph[cycle.node_id()] {
                ElementRef::Block(id) => ctx.resolve(ctx.block(id).name).to_string(),
                ElementRef::Primitive(id) => ctx.resolve(ctx.library().get(id).name).to_string(),
            };
            ArchError::HierarchyCycle {
                parent: name.clone(),
                child: name,
            }
        })?;
        Ok(order
            .into_iter()
            .rev()
            .filter_map(|node| match self.graph[node] {
                ElementRef::Block(id) => Some(id),
                ElementRef::Primitive(_) => None,
            })
            .collect())
    }

    /// Returns `true` if the graph has no cycle.
    pub fn is_acyclic(&self) -> bool {
        toposort(&self.graph, None).is_ok()
    }

    /// Returns the primitives instantiated anywhere.
    pub fn used_primitives(&self) -> BTreeSet<PrimitiveId> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .filter_map(|(_, child)| match self.graph[child] {
                ElementRef::Primitive(id) => Some(id),
                ElementRef::Block(_) => None,
            })
            .collect()
    }
}

/// Returns the configuration bits one copy of `block` consumes, summing
/// primitive costs recursively through nested block instances.
pub fn block_config_bits(ctx: &ArchitectureContext, block: BlockId) -> u64 {
    let mut memo = HashMap::new();
    config_bits_memo(ctx, block, &mut memo)
}

fn config_bits_memo(
    ctx: &ArchitectureContext,
    block: BlockId,
    memo: &mut HashMap<BlockId, u64>,
) -> u64 {
    if let Some(&bits) = memo.get(&block) {
        return bits;
    }
    // Seed before recursing so a malformed cyclic graph terminates.
    memo.insert(block, 0);
    let bits = ctx
        .block(block)
        .instances()
        .map(|inst| match inst.element {
            ElementRef::Primitive(id) => ctx.library().get(id).kind.config_bits(),
            ElementRef::Block(child) => config_bits_memo(ctx, child, memo),
        })
        .sum();
    memo.insert(block, bits);
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Orientation;

    #[test]
    fn bottom_up_order_puts_children_first() {
        let mut ctx = ArchitectureContext::new("h", 4, 4).unwrap();
        let top = ctx.create_logic_block("top", 1, 1).unwrap();
        let mid = ctx.create_logic_block("mid", 1, 1).unwrap();
        let leaf = ctx.create_logic_block("leaf", 1, 1).unwrap();
        ctx.block_mut(mid).unwrap().instantiate_block(leaf, "l").unwrap();
        ctx.block_mut(top).unwrap().instantiate_block(mid, "m").unwrap();
        let order = Hierarchy::build(&ctx).blocks_bottom_up(&ctx).unwrap();
        let pos = |id| order.iter().position(|&b| b == id).unwrap();
        assert!(pos(leaf) < pos(mid));
        assert!(pos(mid) < pos(top));
    }

    #[test]
    fn config_bits_recurse_through_blocks() {
        let mut ctx = ArchitectureContext::new("h", 4, 4).unwrap();
        let lut4 = ctx.primitive("lut4").unwrap();
        let frac = ctx.primitive("fraclut6sffc").unwrap();
        let inner = ctx.create_logic_block("inner", 1, 1).unwrap();
        let outer = ctx.create_logic_block("outer", 1, 1).unwrap();
        ctx.block_mut(inner).unwrap().instantiate_primitive(lut4, "a").unwrap();
        ctx.block_mut(inner).unwrap().instantiate_primitive(lut4, "b").unwrap();
        {
            let mut b = ctx.block_mut(outer).unwrap();
            b.instantiate_block(inner, "i0").unwrap();
            b.instantiate_block(inner, "i1").unwrap();
            b.instantiate_primitive(frac, "f").unwrap();
        }
        assert_eq!(block_config_bits(&ctx, inner), 32);
        assert_eq!(block_config_bits(&ctx, outer), 2 * 32 + 67);
    }

    #[test]
    fn used_primitives_only_instantiated() {
        let mut ctx = ArchitectureContext::new("h", 4, 4).unwrap();
        let iob = ctx.create_io_block("iob", 1).unwrap();
        ctx.create_tile("io", iob, Orientation::WEST).unwrap();
        let used = Hierarchy::build(&ctx).used_primitives();
        assert_eq!(used.len(), 1);
        let pad = ctx.primitive("iopad").unwrap();
        assert!(used.contains(&pad));
    }
}
