//! # rd-rs: Reaching definitions and points-to sets
//!
//! **`rd-rs`** is the data-flow core of a pointer-aware static analyzer. It answers, for every
//! node of a control-flow graph, *which earlier writes to a given byte range of a memory object
//! may still be observed here*.
//!
//! ## Key Features
//!
//! - **Points-to sets**: [`PointsToSet`][crate::points_to::PointsToSet] stores `(target, offset)` pairs in a
//!   dense bit index for small offsets and spills everything else into an ordered overflow set.
//! - **Explicit interning**: targets get dense ids from a shared [`TargetTable`][crate::target::TargetTable],
//!   so there is no global state.
//! - **Byte-range precision**: definitions are tracked per [`DefSite`][crate::def_site::DefSite],
//!   with strong updates (overwrites) and weak updates (may-writes).
//! - **Bounded precision**: contributor sets larger than a configured cap collapse to unknown memory,
//!   which keeps the analysis sound and terminating.
//! - **Arena graph**: nodes are addressed by [`NodeId`][crate::node::NodeId]; cycles are just id lists.
//!
//! ## Basic Usage
//!
//! ```rust
//! use rd_rs::analysis::{AnalysisConfig, ReachingDefinitionsAnalysis};
//! use rd_rs::def_site::DefSite;
//! use rd_rs::graph::ReachingDefinitionsGraph;
//! use rd_rs::node::NodeKind;
//! use rd_rs::offset::Offset;
//!
//! // 1. Build the graph: an object `x` and two branches writing to it
//! let mut graph = ReachingDefinitionsGraph::new();
//! let x = graph.create(NodeKind::Alloc);
//! let entry = graph.create(NodeKind::Store);
//! let maybe = graph.create(NodeKind::Store);
//! let read = graph.create(NodeKind::Load);
//! graph.add_edge(entry, maybe);
//! graph.add_edge(entry, read);
//! graph.add_edge(maybe, read);
//! graph.set_root(entry);
//!
//! // 2. Describe the memory effects
//! let field = DefSite::new(x, Offset::new(0), Offset::new(4));
//! graph.node_mut(entry).add_overwrites(field);
//! graph.node_mut(maybe).add_def(field);
//! graph.node_mut(read).add_use(field);
//!
//! // 3. Run to the fixed point
//! let mut analysis = ReachingDefinitionsAnalysis::new(graph, AnalysisConfig::default());
//! analysis.run();
//!
//! // 4. Both writes may be observed by the read
//! let reaching = analysis.reaching_definitions(read, x, Offset::new(0), Offset::new(4));
//! assert_eq!(reaching.into_iter().collect::<Vec<_>>(), vec![entry, maybe]);
//! ```
//!
//! ## Modules
//!
//! - [`offset`]: byte offsets with an unknown value
//! - [`target`], [`pointer`], [`points_to`], [`memory`]: the points-to model
//! - [`def_site`], [`rd_map`]: definitions and their maps
//! - [`node`], [`block`], [`graph`]: the graph model
//! - [`bfs`], [`analysis`]: traversal and the fixed point
//! - [`dot`]: Graphviz export and dumps

pub mod analysis;
pub mod bfs;
pub mod bitset;
pub mod block;
pub mod def_site;
pub mod dot;
pub mod graph;
pub mod memory;
pub mod node;
pub mod offset;
pub mod pointer;
pub mod points_to;
pub mod rd_map;
pub mod target;
