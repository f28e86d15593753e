//! Nodes of the reaching-definitions graph.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;

use crate::block::BlockId;
use crate::def_site::DefSite;
use crate::offset::Offset;
use crate::rd_map::{NodeSet, RdMap};
use crate::target::MemoryTarget;

/// Identity of a node (1-indexed).
///
/// Node ids double as memory targets: allocation nodes are the objects that
/// def sites write to. Id 0 is reserved for [`NodeId::UNKNOWN_MEMORY`], and the
/// two largest ids for [`NodeId::NULL`] and [`NodeId::INVALIDATED`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Largest id usable by a real node.
    pub const MAX: u32 = u32::MAX - 2;

    /// Creates a node id.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0` or `id` is one of the reserved ids.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Node ids must be >= 1");
        assert!(id <= Self::MAX, "Node id {} is reserved", id);
        NodeId(id)
    }

    /// Returns the raw id as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the position of the node in the graph arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl MemoryTarget for NodeId {
    const UNKNOWN_MEMORY: Self = NodeId(0);
    const NULL: Self = NodeId(u32::MAX);
    const INVALIDATED: Self = NodeId(u32::MAX - 1);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown_memory() {
            write!(f, "unknown")
        } else if self.is_null() {
            write!(f, "null")
        } else if self.is_invalidated() {
            write!(f, "invalidated")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}

/// Kind of a node.
///
/// The kinds are only informative for the analysis itself: every node is
/// processed through its def, overwrite and use sites. Builders and clients
/// use the kind to type-check graphs and to classify results.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// Invalid node (only the unknown-memory placeholder has this kind).
    None,
    /// Static memory allocation site.
    Alloc,
    /// Dynamic memory allocation site.
    DynAlloc,
    /// Writes memory.
    Store,
    /// Reads memory.
    Load,
    /// Merges information from several locations.
    Phi,
    /// Return from the subprocedure.
    Return,
    Call,
    /// Return from the call (in the caller).
    CallReturn,
    Fork,
    Join,
    /// Placeholder with no effect.
    Noop,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::None => "none",
            NodeKind::Alloc => "alloc",
            NodeKind::DynAlloc => "dyn_alloc",
            NodeKind::Store => "store",
            NodeKind::Load => "load",
            NodeKind::Phi => "phi",
            NodeKind::Return => "return",
            NodeKind::Call => "call",
            NodeKind::CallReturn => "call_return",
            NodeKind::Fork => "fork",
            NodeKind::Join => "join",
            NodeKind::Noop => "noop",
        }
    }

    /// Checks whether nodes of this kind represent memory objects.
    pub fn is_allocation(self) -> bool {
        match self {
            NodeKind::Alloc | NodeKind::DynAlloc => true,
            NodeKind::None
            | NodeKind::Store
            | NodeKind::Load
            | NodeKind::Phi
            | NodeKind::Return
            | NodeKind::Call
            | NodeKind::CallReturn
            | NodeKind::Fork
            | NodeKind::Join
            | NodeKind::Noop => false,
        }
    }

    /// Checks whether nodes of this kind may carry def or overwrite sites.
    pub fn may_write(self) -> bool {
        match self {
            NodeKind::Store | NodeKind::Call | NodeKind::CallReturn | NodeKind::Return | NodeKind::Phi => true,
            // Allocation sites define their (uninitialized) contents.
            NodeKind::Alloc | NodeKind::DynAlloc => true,
            NodeKind::None | NodeKind::Load | NodeKind::Fork | NodeKind::Join | NodeKind::Noop => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A node of the reaching-definitions graph.
///
/// Nodes are created by [`ReachingDefinitionsGraph::create`][crate::graph::ReachingDefinitionsGraph::create]
/// and refer to each other only through ids.
#[derive(Debug, Clone)]
pub struct RdNode {
    id: NodeId,
    kind: NodeKind,
    block: Option<BlockId>,
    /// Last BFS run that reached this node.
    pub(crate) dfs_id: Cell<u32>,

    pub(crate) successors: Vec<NodeId>,
    pub(crate) predecessors: Vec<NodeId>,

    /// Weak updates.
    defs: BTreeSet<DefSite>,
    /// Strong updates.
    overwrites: BTreeSet<DefSite>,
    /// Memory read by this node.
    uses: BTreeSet<DefSite>,

    def_map: RdMap,
}

impl RdNode {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            block: None,
            dfs_id: Cell::new(0),
            successors: Vec::new(),
            predecessors: Vec::new(),
            defs: BTreeSet::new(),
            overwrites: BTreeSet::new(),
            uses: BTreeSet::new(),
            def_map: RdMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Checks whether this is the unknown-memory placeholder.
    pub fn is_unknown(&self) -> bool {
        self.id.is_unknown_memory()
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    pub(crate) fn set_block(&mut self, block: Option<BlockId>) {
        self.block = block;
    }

    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    pub fn predecessors(&self) -> &[NodeId] {
        &self.predecessors
    }

    pub fn defs(&self) -> &BTreeSet<DefSite> {
        &self.defs
    }

    pub fn overwrites(&self) -> &BTreeSet<DefSite> {
        &self.overwrites
    }

    pub fn uses(&self) -> &BTreeSet<DefSite> {
        &self.uses
    }

    /// Checks whether this node writes `offset` of `target`.
    ///
    /// With an unknown offset, any write to `target` counts.
    pub fn defines(&self, target: NodeId, offset: Offset) -> bool {
        self.defs
            .iter()
            .chain(self.overwrites.iter())
            .filter(|ds| ds.target == target)
            .any(|ds| offset.is_unknown() || offset.in_range(ds.offset, ds.end()))
    }

    /// Checks whether this node reads unknown memory.
    pub fn uses_unknown(&self) -> bool {
        self.uses.iter().any(|ds| ds.target.is_unknown_memory())
    }

    pub fn add_use(&mut self, ds: DefSite) {
        self.uses.insert(ds);
    }

    pub fn add_uses(&mut self, uses: impl IntoIterator<Item = DefSite>) {
        self.uses.extend(uses);
    }

    /// Registers a weak update of `ds`.
    pub fn add_def(&mut self, ds: DefSite) {
        self.add_def_with(ds, false);
    }

    fn assert_writes(&self) {
        assert!(self.kind.may_write(), "Nodes of kind {} cannot write memory", self.kind);
    }

    /// Registers an update of `ds`, strong if `strong_update` is set.
    ///
    /// The site is folded into the node's own map right away.
    ///
    /// # Panics
    ///
    /// Panics if nodes of this kind cannot write memory.
    pub fn add_def_with(&mut self, ds: DefSite, strong_update: bool) {
        self.assert_writes();
        if strong_update {
            self.overwrites.insert(ds);
        } else {
            self.defs.insert(ds);
        }
        self.def_map.update(ds, self.id);
    }

    pub fn add_defs(&mut self, defs: impl IntoIterator<Item = DefSite>) {
        for ds in defs {
            self.add_def(ds);
        }
    }

    /// Registers a strong update of `ds`.
    ///
    /// # Panics
    ///
    /// Panics if nodes of this kind cannot write memory.
    pub fn add_overwrites(&mut self, ds: DefSite) {
        self.assert_writes();
        self.overwrites.insert(ds);
    }

    pub fn is_overwritten(&self, ds: &DefSite) -> bool {
        self.overwrites.contains(ds)
    }

    /// Definitions reaching this node.
    pub fn reaching_definitions(&self) -> &RdMap {
        &self.def_map
    }

    pub(crate) fn set_reaching_definitions(&mut self, map: RdMap) {
        self.def_map = map;
    }

    /// Nodes whose writes to `[offset, offset + len)` of `target` may be observed here.
    pub fn get_reaching_definitions(&self, target: NodeId, offset: Offset, len: Offset) -> NodeSet {
        self.def_map.get(target, offset, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(target: u32, offset: u64, len: u64) -> DefSite {
        DefSite::new(NodeId::new(target), Offset::new(offset), Offset::new(len))
    }

    #[test]
    fn test_node_id() {
        let id = NodeId::new(5);
        assert_eq!(id.id(), 5);
        assert_eq!(id.index(), 5);
        assert_eq!(id.to_string(), "@5");
        assert_eq!(NodeId::UNKNOWN_MEMORY.to_string(), "unknown");
        assert_eq!(NodeId::NULL.to_string(), "null");
    }

    #[test]
    #[should_panic(expected = "Node ids must be >= 1")]
    fn test_node_id_zero_panics() {
        NodeId::new(0);
    }

    #[test]
    #[should_panic(expected = "is reserved")]
    fn test_node_id_reserved_panics() {
        NodeId::new(u32::MAX);
    }

    #[test]
    fn test_kind() {
        assert!(NodeKind::Alloc.is_allocation());
        assert!(NodeKind::DynAlloc.is_allocation());
        assert!(!NodeKind::Store.is_allocation());
        assert!(NodeKind::Store.may_write());
        assert!(!NodeKind::Load.may_write());
        assert_eq!(NodeKind::CallReturn.to_string(), "call_return");
    }

    #[test]
    fn test_defines() {
        let mut node = RdNode::new(NodeId::new(2), NodeKind::Store);
        node.add_def(site(1, 0, 4));
        node.add_overwrites(site(1, 8, 4));

        assert!(node.defines(NodeId::new(1), Offset::new(0)));
        assert!(node.defines(NodeId::new(1), Offset::new(3)));
        assert!(!node.defines(NodeId::new(1), Offset::new(4)));
        assert!(node.defines(NodeId::new(1), Offset::new(11)));
        assert!(node.defines(NodeId::new(1), Offset::UNKNOWN));
        assert!(!node.defines(NodeId::new(3), Offset::UNKNOWN));
    }

    #[test]
    fn test_add_def_folds_eagerly() {
        let mut node = RdNode::new(NodeId::new(2), NodeKind::Store);
        node.add_def(site(1, 0, 4));
        node.add_def_with(site(1, 4, 4), true);
        node.add_overwrites(site(1, 8, 4));

        assert!(node.is_overwritten(&site(1, 4, 4)));
        assert!(node.is_overwritten(&site(1, 8, 4)));
        assert_eq!(node.defs().len(), 1);
        assert_eq!(node.overwrites().len(), 2);

        let map = node.reaching_definitions();
        assert_eq!(map.len(), 2);
        assert_eq!(
            node.get_reaching_definitions(NodeId::new(1), Offset::new(0), Offset::new(8)),
            NodeSet::from([NodeId::new(2)])
        );
    }

    #[test]
    #[should_panic(expected = "Nodes of kind load cannot write memory")]
    fn test_load_cannot_define() {
        let mut node = RdNode::new(NodeId::new(2), NodeKind::Load);
        node.add_def(site(1, 0, 4));
    }

    #[test]
    #[should_panic(expected = "Nodes of kind noop cannot write memory")]
    fn test_noop_cannot_overwrite() {
        let mut node = RdNode::new(NodeId::new(2), NodeKind::Noop);
        node.add_overwrites(site(1, 0, 4));
    }

    #[test]
    fn test_uses_unknown() {
        let mut node = RdNode::new(NodeId::new(2), NodeKind::Load);
        node.add_use(site(1, 0, 4));
        assert!(!node.uses_unknown());
        node.add_uses([DefSite::whole(NodeId::UNKNOWN_MEMORY)]);
        assert!(node.uses_unknown());
        assert_eq!(node.uses().len(), 2);
    }
}
