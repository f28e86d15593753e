//! Graph to DOT (Graphviz) conversion, and a textual dump of analysis results.
//!
//! The generated DOT output follows these conventions:
//! - **Nodes** are labeled with their id and kind; allocation nodes use a separate shape
//! - **Def sites** optionally follow the label: `+=` for weak updates, `:=` for strong ones
//! - **Edges** are the CFG successor edges
//! - **Blocks**, once built, become clusters
//!
//! # Examples
//!
//! ```
//! use rd_rs::graph::ReachingDefinitionsGraph;
//! use rd_rs::node::NodeKind;
//!
//! let mut graph = ReachingDefinitionsGraph::new();
//! let a = graph.create(NodeKind::Store);
//! let b = graph.create(NodeKind::Load);
//! graph.add_edge(a, b);
//! graph.set_root(a);
//! graph.build_blocks();
//!
//! let dot = graph.to_dot().unwrap();
//! assert!(dot.contains("n1 -> n2;"));
//! ```

use std::fmt::Write as _;

use crate::graph::ReachingDefinitionsGraph;
use crate::node::RdNode;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for ordinary nodes (default: "box")
    pub node_shape: &'static str,
    /// Shape for allocation nodes (default: "ellipse")
    pub alloc_shape: &'static str,
    /// Shape for the root node (default: "doubleoctagon")
    pub root_shape: &'static str,
    /// Whether to draw blocks as clusters (default: true)
    pub cluster_blocks: bool,
    /// Whether to list def and overwrite sites in node labels (default: true)
    pub show_def_sites: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "box",
            alloc_shape: "ellipse",
            root_shape: "doubleoctagon",
            cluster_blocks: true,
            show_def_sites: true,
        }
    }
}

impl ReachingDefinitionsGraph {
    /// Converts the graph to DOT format with the default configuration.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the graph to DOT format.
    ///
    /// Nodes that belong to a block are emitted inside the block's cluster
    /// when `config.cluster_blocks` is set; the others are emitted at top level.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        if config.cluster_blocks {
            for block in self.blocks() {
                writeln!(dot, "subgraph cluster_{} {{", block.id().id())?;
                writeln!(dot, "label=\"{}\";", block.id())?;
                for id in block.nodes() {
                    self.write_node(&mut dot, self.node(id), config)?;
                }
                writeln!(dot, "}}")?;
            }
        }
        for node in self.nodes() {
            if !config.cluster_blocks || node.block().is_none() {
                self.write_node(&mut dot, node, config)?;
            }
        }

        for node in self.nodes() {
            for succ in node.successors() {
                writeln!(dot, "n{} -> n{};", node.id().id(), succ.id())?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    fn write_node(&self, dot: &mut String, node: &RdNode, config: &DotConfig) -> std::fmt::Result {
        let shape = if self.root() == Some(node.id()) {
            config.root_shape
        } else if node.kind().is_allocation() {
            config.alloc_shape
        } else {
            config.node_shape
        };
        write!(dot, "n{} [shape={}, label=\"{} {}", node.id().id(), shape, node.id(), node.kind())?;
        if config.show_def_sites {
            for ds in node.defs() {
                write!(dot, "\\n{} +=", ds)?;
            }
            for ds in node.overwrites() {
                write!(dot, "\\n{} :=", ds)?;
            }
        }
        writeln!(dot, "\"];")
    }

    /// Dumps the reaching definitions of every node, one node per paragraph.
    ///
    /// ```text
    /// @3 load
    ///   @1[0..4) <- @2
    /// ```
    pub fn dump_reaching_definitions(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        for node in self.nodes() {
            writeln!(out, "{} {}", node.id(), node.kind())?;
            for (site, nodes) in node.reaching_definitions().iter() {
                write!(out, "  {} <-", site)?;
                for n in nodes {
                    write!(out, " {}", n)?;
                }
                writeln!(out)?;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def_site::DefSite;
    use crate::node::NodeKind;
    use crate::offset::Offset;

    fn sample() -> ReachingDefinitionsGraph {
        let mut graph = ReachingDefinitionsGraph::new();
        let x = graph.create(NodeKind::Alloc);
        let a = graph.create(NodeKind::Store);
        let b = graph.create(NodeKind::Load);
        graph.add_edge(a, b);
        graph.set_root(a);
        graph.node_mut(a).add_def(DefSite::new(x, Offset::new(0), Offset::new(4)));
        graph
    }

    #[test]
    fn test_to_dot() {
        let graph = sample();
        let dot = graph.to_dot().unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("n1 [shape=ellipse, label=\"@1 alloc\"];"));
        assert!(dot.contains("n2 [shape=doubleoctagon, label=\"@2 store\\n@1[0..4) +=\"];"));
        assert!(dot.contains("n2 -> n3;"));
        assert!(!dot.contains("cluster_"));
    }

    #[test]
    fn test_to_dot_clusters() {
        let mut graph = sample();
        graph.build_blocks();
        let dot = graph.to_dot().unwrap();
        assert!(dot.contains("subgraph cluster_0 {"));
        assert!(dot.contains("label=\"B0\";"));

        let flat = graph
            .to_dot_with_config(&DotConfig {
                cluster_blocks: false,
                show_def_sites: false,
                ..DotConfig::default()
            })
            .unwrap();
        assert!(!flat.contains("cluster_"));
        assert!(flat.contains("label=\"@2 store\"];"));
    }

    #[test]
    fn test_dump_reaching_definitions() {
        let graph = sample();
        let dump = graph.dump_reaching_definitions().unwrap();
        assert_eq!(dump, "@1 alloc\n@2 store\n  @1[0..4) <- @2\n@3 load\n");
    }
}
