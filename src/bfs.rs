//! Breadth-first traversal over id-linked graphs.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use crate::graph::ReachingDefinitionsGraph;
use crate::node::NodeId;

/// Remembers which nodes a traversal has already reached.
pub trait VisitTracker<N> {
    /// Marks `node` as visited. Returns true on the first visit.
    fn visit(&mut self, node: N) -> bool;
}

/// Tracks visited nodes in a hash set.
#[derive(Debug, Clone)]
pub struct SetTracker<N> {
    visited: HashSet<N>,
}

impl<N> Default for SetTracker<N> {
    fn default() -> Self {
        Self { visited: HashSet::new() }
    }
}

impl<N> SetTracker<N> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<N> VisitTracker<N> for SetTracker<N>
where
    N: Eq + Hash,
{
    fn visit(&mut self, node: N) -> bool {
        self.visited.insert(node)
    }
}

/// Tracks visited nodes by stamping them with the id of the current run.
///
/// Stamps live in the nodes themselves, so starting a new run with a fresh id
/// forgets all previous visits without touching any node.
#[derive(Debug)]
pub struct StampTracker<'g> {
    graph: &'g ReachingDefinitionsGraph,
    run: u32,
}

impl<'g> StampTracker<'g> {
    /// # Panics
    ///
    /// Panics if `run == 0`: fresh nodes carry stamp 0.
    pub fn new(graph: &'g ReachingDefinitionsGraph, run: u32) -> Self {
        assert_ne!(run, 0, "Run ids must be >= 1");
        Self { graph, run }
    }
}

impl VisitTracker<NodeId> for StampTracker<'_> {
    fn visit(&mut self, node: NodeId) -> bool {
        let stamp = &self.graph.node(node).dfs_id;
        if stamp.get() == self.run {
            return false;
        }
        stamp.set(self.run);
        true
    }
}

#[derive(Debug)]
pub struct Bfs<V> {
    tracker: V,
}

impl<V> Bfs<V> {
    pub fn new(tracker: V) -> Self {
        Self { tracker }
    }

    /// Visits every node reachable from `start` in breadth-first order,
    /// calling `f` once per node. Nodes seen by the tracker before are skipped.
    pub fn run<N, S, I, F>(&mut self, start: N, mut successors: S, mut f: F)
    where
        N: Copy,
        V: VisitTracker<N>,
        S: FnMut(N) -> I,
        I: IntoIterator<Item = N>,
        F: FnMut(N),
    {
        if !self.tracker.visit(start) {
            return;
        }
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            f(node);
            for succ in successors(node) {
                if self.tracker.visit(succ) {
                    queue.push_back(succ);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn diamond() -> (ReachingDefinitionsGraph, Vec<NodeId>) {
        let mut graph = ReachingDefinitionsGraph::new();
        let ids: Vec<_> = (0..4).map(|_| graph.create(NodeKind::Noop)).collect();
        graph.add_edge(ids[0], ids[1]);
        graph.add_edge(ids[0], ids[2]);
        graph.add_edge(ids[1], ids[3]);
        graph.add_edge(ids[2], ids[3]);
        graph.add_edge(ids[3], ids[0]);
        (graph, ids)
    }

    #[test]
    fn test_bfs_with_set_tracker() {
        let adjacency = [vec![1, 2], vec![3], vec![3], vec![0]];
        let mut order = Vec::new();
        Bfs::new(SetTracker::new()).run(0usize, |n| adjacency[n].clone(), |n| order.push(n));
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_bfs_with_stamps() {
        let (graph, ids) = diamond();
        let mut order = Vec::new();
        Bfs::new(StampTracker::new(&graph, 1)).run(
            ids[0],
            |n| graph.node(n).successors().to_vec(),
            |n| order.push(n),
        );
        assert_eq!(order, ids);
        assert!(graph.nodes().all(|n| n.dfs_id.get() == 1));

        // Same run id: everything counts as visited.
        let mut again = Vec::new();
        Bfs::new(StampTracker::new(&graph, 1)).run(
            ids[0],
            |n| graph.node(n).successors().to_vec(),
            |n| again.push(n),
        );
        assert!(again.is_empty());

        // Next run id: nothing is visited yet.
        let mut next = Vec::new();
        Bfs::new(StampTracker::new(&graph, 2)).run(
            ids[2],
            |n| graph.node(n).successors().to_vec(),
            |n| next.push(n),
        );
        assert_eq!(next, vec![ids[2], ids[3], ids[0], ids[1]]);
    }
}
