//! End-to-end runs of both loop state machines over a real shared region.
//!
//! The named primitives are process-shared, so threads attached to the same
//! session exercise exactly the code paths the two binaries run.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tricolor_cli::{GeneratorLoop, Outcome, SupervisorLoop};
use tricolor_core::{Edge, Graph};
use tricolor_shared_memory::{SharedRegion, SolutionChannel};

fn unique_session(tag: &str) -> String {
    format!("tricolor-test-e2e-{}-{}", tag, uuid::Uuid::new_v4().simple())
}

fn run_pipeline(graph_edges: &[Edge], limit: Option<u32>) -> (Outcome, Option<u32>) {
    let session = unique_session("run");
    let master = SharedRegion::create(&session).unwrap();

    std::thread::scope(|scope| {
        let generators: Vec<_> = (0..2)
            .map(|_| {
                let session = session.clone();
                let graph = Graph::from_edges(graph_edges).unwrap();
                scope.spawn(move || {
                    let region = SharedRegion::attach(&session).unwrap();
                    let mut sink = SolutionChannel::new(&region);
                    GeneratorLoop::new(graph, rand::thread_rng())
                        .run(&mut sink)
                        .unwrap();
                })
            })
            .collect();

        let mut source = SolutionChannel::new(&master);
        let mut supervisor = SupervisorLoop::new(limit, Arc::new(AtomicBool::new(false)));
        let outcome = supervisor.run(&mut source).unwrap();

        SolutionChannel::new(&master).signal_shutdown().unwrap();
        for generator in generators {
            generator.join().unwrap();
        }

        (outcome, supervisor.best())
    })
}

#[test]
fn test_colorable_graph_ends_with_colorable_verdict() {
    // A triangle is 3-colorable; some generator roll must hit the empty
    // candidate and end the run.
    let triangle = [Edge::new(0, 1), Edge::new(1, 2), Edge::new(0, 2)];
    let (outcome, _) = run_pipeline(&triangle, None);

    assert_eq!(outcome, Outcome::Colorable);
}

#[test]
fn test_uncolorable_graph_hits_the_limit_with_a_best() {
    // K4 is not 3-colorable, so the limit fires and a best of 1..=6 exists.
    let k4 = [
        Edge::new(0, 1),
        Edge::new(0, 2),
        Edge::new(0, 3),
        Edge::new(1, 2),
        Edge::new(1, 3),
        Edge::new(2, 3),
    ];
    let (outcome, best) = run_pipeline(&k4, Some(50));

    match outcome {
        Outcome::NotColorable { best: reported } => {
            assert!((1..=6).contains(&reported));
            assert_eq!(best, Some(reported));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_generators_exit_after_shutdown_without_supervisor_reads() {
    // Signal shutdown with a full buffer: every generator must still stop.
    let session = unique_session("drainless");
    let master = SharedRegion::create(&session).unwrap();
    let k4 = [
        Edge::new(0, 1),
        Edge::new(0, 2),
        Edge::new(0, 3),
        Edge::new(1, 2),
        Edge::new(1, 3),
        Edge::new(2, 3),
    ];

    std::thread::scope(|scope| {
        let worker = {
            let session = session.clone();
            let graph = Graph::from_edges(&k4).unwrap();
            scope.spawn(move || {
                let region = SharedRegion::attach(&session).unwrap();
                let mut sink = SolutionChannel::new(&region);
                GeneratorLoop::new(graph, rand::thread_rng())
                    .run(&mut sink)
                    .unwrap();
            })
        };

        // Give the generator a moment to fill the ring, then pull the plug.
        std::thread::sleep(std::time::Duration::from_millis(50));
        SolutionChannel::new(&master).signal_shutdown().unwrap();

        worker.join().unwrap();
    });
}
