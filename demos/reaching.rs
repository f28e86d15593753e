//! Reaching definitions over a generated control-flow graph.
//!
//! The graph is a chain of `n` diamonds. In every diamond one branch overwrites
//! a field of a shared object and the other branch may write it. With `--loop`,
//! the last diamond jumps back to the first one.
//!
//! Run with:
//! ```bash
//! cargo run --example reaching -- 10 --max-set-size 4 --dot graph.dot
//! ```

use std::path::PathBuf;

use clap::Parser;

use rd_rs::analysis::{AnalysisConfig, ReachingDefinitionsAnalysis};
use rd_rs::def_site::DefSite;
use rd_rs::graph::ReachingDefinitionsGraph;
use rd_rs::node::{NodeId, NodeKind};
use rd_rs::offset::Offset;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of diamonds.
    #[arg(value_name = "INT", default_value = "5")]
    n: usize,

    /// Size of the object field written by every diamond.
    #[clap(long, value_name = "INT", default_value = "4")]
    width: u64,

    /// Largest contributor set kept before collapsing to unknown memory.
    #[clap(long, value_name = "INT")]
    max_set_size: Option<usize>,

    /// Close the chain into a loop.
    #[clap(long = "loop")]
    cyclic: bool,

    /// Write the graph in DOT format to this file.
    #[clap(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Print the reaching definitions of every node.
    #[clap(long)]
    dump: bool,
}

fn build(args: &Cli) -> (ReachingDefinitionsGraph, NodeId, NodeId) {
    let mut graph = ReachingDefinitionsGraph::new();
    let obj = graph.create(NodeKind::Alloc);
    let entry = graph.create(NodeKind::Noop);
    graph.set_root(entry);

    let mut tail = entry;
    for i in 0..args.n {
        let field = DefSite::new(obj, Offset::new(i as u64 % 8 * args.width), Offset::new(args.width));
        let strong = graph.create(NodeKind::Store);
        let weak = graph.create(NodeKind::Store);
        let join = graph.create(NodeKind::Join);
        graph.add_edge(tail, strong);
        graph.add_edge(tail, weak);
        graph.add_edge(strong, join);
        graph.add_edge(weak, join);
        graph.node_mut(strong).add_overwrites(field);
        graph.node_mut(weak).add_def(field);
        graph.node_mut(join).add_use(field);
        tail = join;
    }
    if args.cyclic && tail != entry {
        graph.add_edge(tail, entry);
    }

    let exit = graph.create(NodeKind::Load);
    graph.add_edge(tail, exit);
    graph.node_mut(exit).add_use(DefSite::whole(obj));

    (graph, obj, exit)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let (mut graph, obj, exit) = build(&args);
    graph.build_blocks();
    println!("graph: {} nodes, {} blocks", graph.len(), graph.blocks().len());

    if let Some(path) = &args.dot {
        std::fs::write(path, graph.to_dot()?)?;
        println!("DOT written to {}", path.display());
    }

    let config = match args.max_set_size {
        Some(max) => AnalysisConfig::new(max),
        None => AnalysisConfig::default(),
    };
    let mut analysis = ReachingDefinitionsAnalysis::new(graph, config);

    let time_run = std::time::Instant::now();
    let passes = analysis.run();
    println!("fixed point after {} passes in {:.3} s", passes, time_run.elapsed().as_secs_f64());

    let reaching = analysis.reaching_definitions(exit, obj, Offset::UNKNOWN, Offset::UNKNOWN);
    print!("definitions of {} reaching {}:", obj, exit);
    for node in &reaching {
        print!(" {}", node);
    }
    println!();

    if args.dump {
        print!("{}", analysis.graph().dump_reaching_definitions()?);
    }

    println!("\nAll done in {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
