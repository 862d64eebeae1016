use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tricolor_cli::{init_tracing, GeneratorLoop};
use tricolor_core::{Edge, Graph};
use tricolor_shared_memory::{default_session, SharedRegion, SolutionChannel};

/// Repeatedly proposes edge-removal sets that make the given graph
/// 3-colorable and publishes them to the supervisor.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Session name of the supervisor to publish to
    #[clap(long, default_value_t = default_session())]
    session: String,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,

    /// Graph edges as "A-B" pairs, e.g. 0-1 0-2 0-3 1-2 1-3 2-3
    #[clap(required = true, value_name = "EDGE")]
    edges: Vec<Edge>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let graph = Graph::from_edges(&cli.edges).context("building the graph")?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph parsed"
    );

    // Slave role: the supervisor owns the OS objects, we only attach.
    let region = SharedRegion::attach(&cli.session).with_context(|| {
        format!(
            "attaching to session '{}' (is the supervisor running?)",
            cli.session
        )
    })?;

    let mut sink = SolutionChannel::new(&region);
    GeneratorLoop::new(graph, rand::thread_rng())
        .run(&mut sink)
        .context("publishing solutions")?;

    Ok(())
}
