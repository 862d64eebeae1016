//! tricolor - CLI Module
//!
//! The two process roles of the pipeline: the `supervisor` binary drains
//! solutions and decides the outcome, the `generator` binary produces them.
//! The loop state machines live here so they can be driven by in-process
//! stubs in tests; the binaries only do argument parsing and wiring.

pub mod generator;
pub mod supervisor;

use std::time::Duration;

pub use generator::{GeneratorLoop, SolutionSink};
pub use supervisor::{Outcome, SolutionSource, SupervisorLoop};

/// How long either side dozes when it has nothing to do (empty buffer on the
/// reader, full buffer on a writer) before polling again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Log setup shared by both binaries: `RUST_LOG` wins when set, otherwise
/// `-v` selects debug over info.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
