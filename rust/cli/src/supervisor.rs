//! Supervisor drain loop: track the best solution, enforce the limit,
//! decide the outcome

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tricolor_core::Solution;
use tricolor_shared_memory::{ReadError, SemError, SolutionChannel};

/// Where the drain loop gets its solutions from. The production impl is
/// [`SolutionChannel`]; tests drive the loop with scripted sources.
pub trait SolutionSource {
    fn next_solution(&mut self) -> Result<Solution, ReadError>;

    /// Called between empty polls; implementations may sleep.
    fn idle(&mut self, timeout: Duration);
}

impl SolutionSource for SolutionChannel<'_> {
    fn next_solution(&mut self) -> Result<Solution, ReadError> {
        self.read()
    }

    fn idle(&mut self, timeout: Duration) {
        // The wake-up only ever means "shutdown was signalled", and the
        // supervisor is the one who signals it; a failed doze here is not
        // worth aborting the run over.
        let _ = SolutionChannel::idle(self, timeout);
    }
}

/// Terminal states of the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A `len == 0` solution arrived: the graph is 3-colorable as is
    Colorable,
    /// The solution limit was reached first; `best` is the smallest
    /// removal-set size seen
    NotColorable { best: u32 },
    /// The operator cancelled the run
    Interrupted,
}

/// `WaitingForFirstSolution → Draining → Finished` as a struct: the state
/// is carried in `best`/`seen`, the transition logic in [`Self::run`].
pub struct SupervisorLoop {
    limit: Option<u32>,
    poll: Duration,
    interrupted: Arc<AtomicBool>,
    best: Option<u32>,
    seen: u32,
}

impl SupervisorLoop {
    pub fn new(limit: Option<u32>, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            limit,
            poll: crate::POLL_INTERVAL,
            interrupted,
            best: None,
            seen: 0,
        }
    }

    /// Smallest removal-set size seen so far.
    pub fn best(&self) -> Option<u32> {
        self.best
    }

    /// Number of solutions successfully read.
    pub fn seen(&self) -> u32 {
        self.seen
    }

    /// Drains the source until a terminal state. `Err` is the fatal
    /// semaphore case; everything else is an [`Outcome`].
    pub fn run<S: SolutionSource>(&mut self, source: &mut S) -> Result<Outcome, SemError> {
        loop {
            if self.interrupted.load(Ordering::Relaxed) {
                info!("interrupt received, shutting down");
                return Ok(Outcome::Interrupted);
            }

            let solution = match source.next_solution() {
                Ok(solution) => solution,
                Err(ReadError::Empty) => {
                    source.idle(self.poll);
                    continue;
                }
                Err(ReadError::Sync(e)) => return Err(e),
            };

            self.seen += 1;
            if self.seen == 1 {
                debug!("first solution received");
            }

            if solution.is_colorable() {
                info!(seen = self.seen, "graph is 3-colorable");
                return Ok(Outcome::Colorable);
            }

            self.observe(&solution);

            if let Some(limit) = self.limit {
                if self.seen >= limit {
                    info!(limit, "solution limit reached");
                    // At least one non-sentinel solution was counted, so a
                    // best exists; the fallback can't actually trigger.
                    let best = self.best.unwrap_or_else(|| solution.len());
                    return Ok(Outcome::NotColorable { best });
                }
            }
        }
    }

    /// Updates the best-known solution; returns whether it improved.
    /// Ties and worse solutions leave the record untouched.
    fn observe(&mut self, solution: &Solution) -> bool {
        let len = solution.len();
        match self.best {
            Some(best) if len >= best => false,
            _ => {
                self.best = Some(len);
                info!(
                    removed = len,
                    edges = ?solution.edges(),
                    "new best solution"
                );
                true
            }
        }
    }
}
