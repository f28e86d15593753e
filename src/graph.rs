//! The reaching-definitions graph.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Slot 0 holds the
//! unknown-memory placeholder, so real nodes are numbered from 1 and an id is
//! its own arena index. Edges are stored as id lists on both endpoints.

use std::collections::VecDeque;

use log::debug;

use crate::block::{BasicBlock, BlockId};
use crate::node::{NodeId, NodeKind, RdNode};
use crate::target::MemoryTarget;

#[derive(Debug, Clone)]
pub struct ReachingDefinitionsGraph {
    nodes: Vec<RdNode>,
    blocks: Vec<BasicBlock>,
    root: Option<NodeId>,
}

impl Default for ReachingDefinitionsGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachingDefinitionsGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![RdNode::new(NodeId::UNKNOWN_MEMORY, NodeKind::None)],
            blocks: Vec::new(),
            root: None,
        }
    }

    /// Allocates a node of the given kind with a fresh id.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`NodeKind::None`].
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        assert_ne!(kind, NodeKind::None, "Cannot create a node of kind none");
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(RdNode::new(id, kind));
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.node(root);
        self.root = Some(root);
    }

    /// Number of created nodes (the placeholder excluded).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Returns the node with the given id.
    ///
    /// The unknown-memory placeholder is a valid (empty) node.
    ///
    /// # Panics
    ///
    /// Panics if the id was not created by this graph.
    pub fn node(&self, id: NodeId) -> &RdNode {
        assert!(self.contains(id), "Node {} does not exist", id);
        &self.nodes[id.index()]
    }

    /// # Panics
    ///
    /// Panics if the id was not created by this graph.
    pub fn node_mut(&mut self, id: NodeId) -> &mut RdNode {
        assert!(self.contains(id), "Node {} does not exist", id);
        &mut self.nodes[id.index()]
    }

    /// Iterates over the created nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &RdNode> + '_ {
        self.nodes.iter().skip(1)
    }

    /// Adds the CFG edge `from -> to`. Returns false if it was already there.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        self.node(to);
        if self.node(from).successors.contains(&to) {
            return false;
        }
        self.node_mut(from).successors.push(to);
        self.node_mut(to).predecessors.push(from);
        true
    }

    /// Places `new` in front of `existing`: every predecessor of `existing`
    /// now flows into `new`, and `new` flows into `existing`.
    ///
    /// If `existing` was the root, `new` becomes the root.
    pub fn insert_before(&mut self, new: NodeId, existing: NodeId) {
        assert_ne!(new, existing, "Cannot insert a node before itself");
        self.node(new);
        self.node_mut(new).successors.retain(|&s| s != existing);
        let preds: Vec<NodeId> = std::mem::take(&mut self.node_mut(existing).predecessors)
            .into_iter()
            .filter(|&p| p != new)
            .collect();
        for &pred in &preds {
            let succs = &mut self.node_mut(pred).successors;
            for succ in succs.iter_mut() {
                if *succ == existing {
                    *succ = new;
                }
            }
            // The predecessor may have already had an edge to `new`.
            let mut seen = Vec::with_capacity(succs.len());
            succs.retain(|s| {
                if seen.contains(s) {
                    false
                } else {
                    seen.push(*s);
                    true
                }
            });
        }
        for pred in preds {
            if !self.node(new).predecessors.contains(&pred) {
                self.node_mut(new).predecessors.push(pred);
            }
        }
        self.add_edge(new, existing);
        if self.root == Some(existing) {
            self.root = Some(new);
        }
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// # Panics
    ///
    /// Panics if the block does not exist.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        assert!(id.index() < self.blocks.len(), "Block {} does not exist", id);
        &self.blocks[id.index()]
    }

    pub fn block_of(&self, node: NodeId) -> Option<&BasicBlock> {
        self.node(node).block().map(|b| self.block(b))
    }

    /// Adds `node` at the beginning of `block`, rewiring the CFG so that the
    /// predecessors of the old first node flow into `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` already belongs to a block.
    pub fn prepend_and_update_cfg(&mut self, block: BlockId, node: NodeId) {
        self.block(block);
        if let Some(owner) = self.node(node).block() {
            panic!("Node {} already belongs to block {}", node, owner);
        }
        if let Some(first) = self.blocks[block.index()].first() {
            self.insert_before(node, first);
        }
        self.blocks[block.index()].prepend(node);
        self.node_mut(node).set_block(Some(block));
        self.fold_definitions(block, node);
    }

    /// Whether `id` starts a new block: it has no unique predecessor, or its
    /// unique predecessor branches.
    fn is_leader(&self, id: NodeId) -> bool {
        if self.root == Some(id) {
            return true;
        }
        match self.node(id).predecessors() {
            [pred] => *pred == id || self.node(*pred).successors().len() != 1,
            _ => true,
        }
    }

    /// Partitions the nodes into basic blocks, replacing any previous partition.
    ///
    /// Nodes reachable from the root are handled first, so their blocks come
    /// first. Every created node ends up in exactly one block.
    pub fn build_blocks(&mut self) {
        self.blocks.clear();
        for node in self.nodes.iter_mut() {
            node.set_block(None);
        }

        let mut order = Vec::with_capacity(self.len());
        if let Some(root) = self.root {
            let mut seen = vec![false; self.nodes.len()];
            let mut queue = VecDeque::from([root]);
            seen[root.index()] = true;
            while let Some(id) = queue.pop_front() {
                order.push(id);
                for &succ in self.node(id).successors() {
                    if !seen[succ.index()] {
                        seen[succ.index()] = true;
                        queue.push_back(succ);
                    }
                }
            }
        }
        order.extend((1..self.nodes.len() as u32).map(NodeId::new));

        // Leaders first; nodes left over afterwards sit on leaderless cycles.
        for &id in &order {
            if self.node(id).block().is_none() && self.is_leader(id) {
                self.build_block_from(id);
            }
        }
        for &id in &order {
            if self.node(id).block().is_none() {
                self.build_block_from(id);
            }
        }

        debug!("built {} blocks for {} nodes", self.blocks.len(), self.len());
    }

    fn build_block_from(&mut self, start: NodeId) {
        let block = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(block));

        let mut current = start;
        loop {
            self.blocks[block.index()].append(current);
            self.node_mut(current).set_block(Some(block));
            self.fold_definitions(block, current);

            let next = match self.node(current).successors() {
                [succ] => *succ,
                _ => break,
            };
            if self.node(next).block().is_some() || self.node(next).predecessors().len() != 1 || self.root == Some(next) {
                break;
            }
            current = next;
        }
    }

    fn fold_definitions(&mut self, block: BlockId, id: NodeId) {
        let node = &self.nodes[id.index()];
        let definitions = &mut self.blocks[block.index()].definitions;
        for &ds in node.overwrites() {
            definitions.kill(&ds);
            definitions.update(ds, id);
        }
        for &ds in node.defs() {
            definitions.add(ds, id, usize::MAX);
        }
    }
}
