//! Graph edges and their command-line representation

use crate::error::GraphError;
use std::fmt;
use std::str::FromStr;

/// An undirected edge between two nodes.
///
/// `#[repr(C)]` because edges are copied verbatim into the shared memory
/// region as part of a [`crate::Solution`] record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub node1: i32,
    pub node2: i32,
}

impl Edge {
    pub fn new(node1: i32, node2: i32) -> Self {
        Self { node1, node2 }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.node1, self.node2)
    }
}

impl FromStr for Edge {
    type Err = GraphError;

    /// Parses the `"A-B"` form used on the generator command line,
    /// e.g. `0-1` or `12-7`. Node ids must be non-negative integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidEdge(s.to_string());

        let (left, right) = s.split_once('-').ok_or_else(invalid)?;

        let node1: i32 = left.trim().parse().map_err(|_| invalid())?;
        let node2: i32 = right.trim().parse().map_err(|_| invalid())?;

        if node1 < 0 || node2 < 0 {
            return Err(invalid());
        }

        Ok(Edge { node1, node2 })
    }
}
