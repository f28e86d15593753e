//! Basic blocks: maximal chains of nodes with straight-line control flow.

use std::collections::VecDeque;
use std::fmt;

use crate::node::NodeId;
use crate::rd_map::RdMap;

/// Identity of a basic block (0-indexed, in creation order).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BlockId(u32);

impl BlockId {
    pub fn new(id: u32) -> Self {
        BlockId(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    id: BlockId,
    nodes: VecDeque<NodeId>,
    /// Writes performed by the nodes of the block.
    pub(crate) definitions: RdMap,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            nodes: VecDeque::new(),
            definitions: RdMap::new(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Adds `node` at the end of the block.
    ///
    /// Only the block's node list is touched. Use
    /// [`ReachingDefinitionsGraph::add_edge`][crate::graph::ReachingDefinitionsGraph::add_edge]
    /// to keep the CFG consistent.
    pub fn append(&mut self, node: NodeId) {
        self.nodes.push_back(node);
    }

    /// Adds `node` at the beginning of the block.
    ///
    /// See [`ReachingDefinitionsGraph::prepend_and_update_cfg`][crate::graph::ReachingDefinitionsGraph::prepend_and_update_cfg]
    /// for the variant that rewires control flow.
    pub fn prepend(&mut self, node: NodeId) {
        self.nodes.push_front(node);
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.front().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Aggregated writes of all nodes of the block.
    pub fn definitions(&self) -> &RdMap {
        &self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_prepend() {
        let mut block = BasicBlock::new(BlockId::new(0));
        assert!(block.is_empty());
        assert_eq!(block.first(), None);

        block.append(NodeId::new(2));
        block.append(NodeId::new(3));
        block.prepend(NodeId::new(1));

        assert_eq!(block.len(), 3);
        assert_eq!(block.first(), Some(NodeId::new(1)));
        assert!(block.contains(NodeId::new(2)));
        assert_eq!(
            block.nodes().collect::<Vec<_>>(),
            vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(BlockId::new(4).to_string(), "B4");
    }
}
