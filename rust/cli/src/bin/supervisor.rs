use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tricolor_cli::{init_tracing, Outcome, SupervisorLoop};
use tricolor_shared_memory::{default_session, SharedRegion, SolutionChannel};

/// Drains 3-coloring solutions from the shared-memory channel, tracks the
/// best one and shuts the generators down once the verdict is in.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Stop after considering this many solutions
    #[clap(short = 'n', long, value_name = "COUNT")]
    limit: Option<u32>,

    /// Seconds to wait before reading the first solution
    #[clap(short = 'w', long, value_name = "SECS", default_value_t = 0)]
    delay: u64,

    /// Session name the generators must be started with
    #[clap(long, default_value_t = default_session())]
    session: String,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .context("installing the interrupt handler")?;
    }

    // Master role: create the region before any generator can attach.
    let region = SharedRegion::create(&cli.session)
        .with_context(|| format!("setting up shared region for session '{}'", cli.session))?;
    info!(session = %cli.session, "shared region created, generators may attach");

    if cli.delay > 0 {
        std::thread::sleep(Duration::from_secs(cli.delay));
    }

    let mut source = SolutionChannel::new(&region);
    let mut supervisor = SupervisorLoop::new(cli.limit, Arc::clone(&interrupted));
    let result = supervisor.run(&mut source);

    // Whatever happened, tell the generators to stop before reporting.
    if let Err(e) = SolutionChannel::new(&region).signal_shutdown() {
        warn!("signalling shutdown failed: {e}");
    }

    match result {
        Ok(Outcome::Colorable) => {
            println!("the graph is 3-colorable");
        }
        Ok(Outcome::NotColorable { best }) => {
            println!(
                "the graph might not be 3-colorable, best solution removes {best} edges"
            );
        }
        Ok(Outcome::Interrupted) => match supervisor.best() {
            Some(best) => println!(
                "the graph might not be 3-colorable, best solution removes {best} edges"
            ),
            None => eprintln!("interrupted before a single solution could be read"),
        },
        Err(e) => {
            return Err(e).context("reading solutions from the shared channel");
        }
    }

    Ok(())
}
