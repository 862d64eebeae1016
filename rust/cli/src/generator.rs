//! Generator loop: roll candidates, publish them, stop when told to

use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};
use tricolor_core::{Graph, Solution};
use tricolor_shared_memory::{SemError, SolutionChannel, WriteError};

/// Where the generator publishes to. The production impl is
/// [`SolutionChannel`]; tests substitute a recording stub.
pub trait SolutionSink {
    fn publish(&mut self, solution: &Solution) -> Result<(), WriteError>;

    fn is_shut_down(&self) -> Result<bool, SemError>;

    /// Called when the channel is full; implementations may sleep.
    fn idle(&mut self, timeout: Duration);
}

impl SolutionSink for SolutionChannel<'_> {
    fn publish(&mut self, solution: &Solution) -> Result<(), WriteError> {
        self.write(solution)
    }

    fn is_shut_down(&self) -> Result<bool, SemError> {
        SolutionChannel::is_shut_down(self)
    }

    fn idle(&mut self, timeout: Duration) {
        // Waking early on the shutdown post is exactly what we want here;
        // the next loop iteration reads the flag.
        let _ = SolutionChannel::idle(self, timeout);
    }
}

/// `Running → (Compute → Publish) → Stopped`. Stops cleanly on the shutdown
/// flag, with failure on a semaphore error; everything else keeps looping.
pub struct GeneratorLoop<R: Rng> {
    graph: Graph,
    rng: R,
    poll: Duration,
}

impl<R: Rng> GeneratorLoop<R> {
    pub fn new(graph: Graph, rng: R) -> Self {
        Self {
            graph,
            rng,
            poll: crate::POLL_INTERVAL,
        }
    }

    pub fn run<S: SolutionSink>(&mut self, sink: &mut S) -> Result<(), SemError> {
        let mut published: u64 = 0;

        loop {
            if sink.is_shut_down()? {
                info!(published, "shutdown observed, stopping");
                return Ok(());
            }

            let candidate = self.graph.random_candidate(&mut self.rng);

            // Oversized candidates are dropped before the channel is ever
            // touched; the next roll is a fresh chance.
            let Some(solution) = Solution::from_edges(&candidate) else {
                debug!(edges = candidate.len(), "candidate too large, discarded");
                continue;
            };

            match sink.publish(&solution) {
                Ok(()) => {
                    published += 1;
                    debug!(removed = solution.len(), "candidate published");
                }
                Err(WriteError::Full) => sink.idle(self.poll),
                Err(WriteError::Shutdown) => {
                    info!(published, "channel shut down, stopping");
                    return Ok(());
                }
                Err(WriteError::Sync(e)) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tricolor_core::Edge;

    /// Recording sink with a scripted point at which shutdown appears.
    struct Recorder {
        accepted: Vec<Solution>,
        full_rounds: u32,
        shutdown_after: usize,
        polls: u32,
        publish_after_shutdown: bool,
    }

    impl Recorder {
        fn new(shutdown_after: usize) -> Self {
            Self {
                accepted: Vec::new(),
                full_rounds: 0,
                shutdown_after,
                polls: 0,
                publish_after_shutdown: false,
            }
        }

        fn shut_down(&self) -> bool {
            self.accepted.len() >= self.shutdown_after
        }
    }

    impl SolutionSink for Recorder {
        fn publish(&mut self, solution: &Solution) -> Result<(), WriteError> {
            if self.shut_down() {
                self.publish_after_shutdown = true;
                return Err(WriteError::Shutdown);
            }
            if self.full_rounds > 0 {
                self.full_rounds -= 1;
                return Err(WriteError::Full);
            }
            self.accepted.push(*solution);
            Ok(())
        }

        fn is_shut_down(&self) -> Result<bool, SemError> {
            Ok(self.shut_down())
        }

        fn idle(&mut self, _timeout: Duration) {
            self.polls += 1;
        }
    }

    fn k4() -> Graph {
        Graph::from_edges(&[
            Edge::new(0, 1),
            Edge::new(0, 2),
            Edge::new(0, 3),
            Edge::new(1, 2),
            Edge::new(1, 3),
            Edge::new(2, 3),
        ])
        .unwrap()
    }

    #[test]
    fn test_stops_at_shutdown_without_further_writes() {
        let mut sink = Recorder::new(5);
        let mut generator = GeneratorLoop::new(k4(), StdRng::seed_from_u64(1));

        generator.run(&mut sink).unwrap();

        assert_eq!(sink.accepted.len(), 5);
        // The flag is polled before each compute, so the loop ends via
        // is_shut_down, never via a rejected publish.
        assert!(!sink.publish_after_shutdown);
    }

    #[test]
    fn test_published_solutions_are_valid_candidates() {
        let graph = k4();
        let mut sink = Recorder::new(8);
        let mut generator = GeneratorLoop::new(graph, StdRng::seed_from_u64(2));

        generator.run(&mut sink).unwrap();

        for solution in &sink.accepted {
            // K4 is not 3-colorable, so no candidate is ever empty.
            assert!(!solution.is_colorable());
            assert!(solution.len() as usize <= 6);
        }
    }

    #[test]
    fn test_full_channel_is_skipped_not_fatal() {
        let mut sink = Recorder::new(3);
        sink.full_rounds = 4;
        let mut generator = GeneratorLoop::new(k4(), StdRng::seed_from_u64(3));

        generator.run(&mut sink).unwrap();

        assert_eq!(sink.accepted.len(), 3);
        assert_eq!(sink.polls, 4);
    }

    #[test]
    fn test_sync_error_aborts_the_loop() {
        struct Broken;
        impl SolutionSink for Broken {
            fn publish(&mut self, _solution: &Solution) -> Result<(), WriteError> {
                Err(WriteError::Sync(SemError {
                    op: "wait",
                    source: std::io::Error::from_raw_os_error(22),
                }))
            }
            fn is_shut_down(&self) -> Result<bool, SemError> {
                Ok(false)
            }
            fn idle(&mut self, _timeout: Duration) {}
        }

        let mut generator = GeneratorLoop::new(k4(), StdRng::seed_from_u64(4));
        assert!(generator.run(&mut Broken).is_err());
    }
}
