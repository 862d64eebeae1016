//! tricolor - Core Module
//!
//! Graph domain types shared by the supervisor and the generators, plus the
//! randomized heuristic that proposes edge-removal sets making a graph
//! 3-colorable.

pub mod edge;
pub mod error;
pub mod graph;
pub mod solution;

pub use edge::Edge;
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use solution::{Solution, MAX_EDGES};

/// Number of colors the heuristic works with
pub const COLOR_COUNT: u8 = 3;
