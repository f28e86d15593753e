//! The reaching-definitions fixed point.
//!
//! Every pass visits the nodes reachable from the root in breadth-first order
//! and recomputes each node's map from its predecessors:
//!
//! 1. merge the predecessors' maps, dropping entries hidden by the node's overwrites;
//! 2. make the node the only contributor of each overwritten site (strong update);
//! 3. add the node to the contributors of each defined site (weak update).
//!
//! Passes repeat until none of them changes a map. Contributor sets only grow
//! or collapse to `{UNKNOWN_MEMORY}`, so the number of passes is bounded.
//!
//! # Examples
//!
//! ```
//! use rd_rs::analysis::{AnalysisConfig, ReachingDefinitionsAnalysis};
//! use rd_rs::def_site::DefSite;
//! use rd_rs::graph::ReachingDefinitionsGraph;
//! use rd_rs::node::NodeKind;
//! use rd_rs::offset::Offset;
//!
//! let mut graph = ReachingDefinitionsGraph::new();
//! let x = graph.create(NodeKind::Alloc);
//! let store = graph.create(NodeKind::Store);
//! let load = graph.create(NodeKind::Load);
//! graph.add_edge(store, load);
//! graph.set_root(store);
//!
//! let site = DefSite::new(x, Offset::new(0), Offset::new(4));
//! graph.node_mut(store).add_overwrites(site);
//! graph.node_mut(load).add_use(site);
//!
//! let mut analysis = ReachingDefinitionsAnalysis::new(graph, AnalysisConfig::default());
//! analysis.run();
//!
//! let reaching = analysis.reaching_definitions(load, x, Offset::new(0), Offset::new(4));
//! assert!(reaching.contains(&store));
//! assert_eq!(reaching.len(), 1);
//! ```

use log::{debug, trace};

use crate::bfs::{Bfs, StampTracker};
use crate::graph::ReachingDefinitionsGraph;
use crate::node::NodeId;
use crate::offset::Offset;
use crate::rd_map::{NodeSet, RdMap};

/// Tunables of the analysis.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AnalysisConfig {
    /// Largest contributor set kept per def site. Bigger sets collapse to
    /// `{UNKNOWN_MEMORY}`. Must be at least 1.
    pub max_set_size: usize,
}

impl AnalysisConfig {
    /// # Panics
    ///
    /// Panics if `max_set_size == 0`.
    pub fn new(max_set_size: usize) -> Self {
        assert!(max_set_size >= 1, "The set size must be at least 1");
        Self { max_set_size }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { max_set_size: usize::MAX }
    }
}

/// Owns a fully populated graph and computes its reaching definitions.
#[derive(Debug)]
pub struct ReachingDefinitionsAnalysis {
    graph: ReachingDefinitionsGraph,
    root: NodeId,
    config: AnalysisConfig,
    /// Id of the latest BFS run, used as the visit stamp.
    run_id: u32,
}

impl ReachingDefinitionsAnalysis {
    /// # Panics
    ///
    /// Panics if the graph has no root, or if `config.max_set_size == 0`.
    pub fn new(graph: ReachingDefinitionsGraph, config: AnalysisConfig) -> Self {
        let root = graph.root().expect("Root cannot be null");
        assert!(config.max_set_size >= 1, "The set size must be at least 1");
        Self {
            graph,
            root,
            config,
            run_id: 0,
        }
    }

    pub fn graph(&self) -> &ReachingDefinitionsGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ReachingDefinitionsGraph {
        self.graph
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Nodes reachable from `start`, in breadth-first order.
    ///
    /// `expected` is a capacity hint for the result.
    pub fn get_nodes(&mut self, start: NodeId, expected: usize) -> Vec<NodeId> {
        self.run_id += 1;
        let graph = &self.graph;
        let mut order = Vec::with_capacity(expected);
        Bfs::new(StampTracker::new(graph, self.run_id)).run(
            start,
            |id| graph.node(id).successors().to_vec(),
            |id| order.push(id),
        );
        order
    }

    /// Recomputes the map of node `id` from its predecessors. Returns true if it changed.
    pub fn process_node(&mut self, id: NodeId) -> bool {
        let node = self.graph.node(id);
        let max_set_size = self.config.max_set_size;

        let mut map = RdMap::new();
        for &pred in node.predecessors() {
            map.merge(self.graph.node(pred).reaching_definitions(), node.overwrites(), max_set_size);
        }
        for &ds in node.overwrites() {
            map.update(ds, id);
        }
        for &ds in node.defs() {
            map.add(ds, id, max_set_size);
        }

        if &map == node.reaching_definitions() {
            return false;
        }
        trace!("{}: {} sites reach", id, map.len());
        self.graph.node_mut(id).set_reaching_definitions(map);
        true
    }

    /// Iterates passes until the fixed point. Returns the number of passes made.
    pub fn run(&mut self) -> usize {
        let mut passes = 0;
        loop {
            passes += 1;
            let order = self.get_nodes(self.root, self.graph.len());
            let mut changed = 0;
            for id in order {
                if self.process_node(id) {
                    changed += 1;
                }
            }
            debug!("pass {}: {} nodes changed", passes, changed);
            if changed == 0 {
                return passes;
            }
        }
    }

    /// Nodes whose writes to `[offset, offset + len)` of `target` may be observed at `node`.
    pub fn reaching_definitions(&self, node: NodeId, target: NodeId, offset: Offset, len: Offset) -> NodeSet {
        self.graph.node(node).get_reaching_definitions(target, offset, len)
    }
}
