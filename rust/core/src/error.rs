//! Graph-level error types

use thiserror::Error;

/// Errors produced while building a graph from operator input
#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed edge argument
    #[error("invalid edge '{0}', expected '<node>-<node>' with non-negative node ids")]
    InvalidEdge(String),

    /// A graph needs at least one edge to be worth working on
    #[error("the graph has no edges")]
    Empty,
}

/// Convenience type alias
pub type Result<T> = std::result::Result<T, GraphError>;
