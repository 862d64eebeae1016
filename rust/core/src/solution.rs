//! Candidate edge-removal sets as fixed-footprint records

use crate::edge::Edge;

/// Upper bound on the number of edges a single solution may remove.
///
/// Together with the ring capacity this fixes the shared memory layout; a
/// candidate that would need more removals is discarded by the generator
/// before it ever reaches the channel.
pub const MAX_EDGES: usize = 32;

/// A candidate list of edges whose removal makes the remaining graph
/// 3-colorable.
///
/// The record is `#[repr(C)]` and fixed-size so it can be copied in and out
/// of the shared memory ring buffer as a whole slot. Only the first `len`
/// entries of `edges` are meaningful; anything beyond is unspecified.
/// `len == 0` is the sentinel meaning "the graph is 3-colorable as is".
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Solution {
    len: u32,
    edges: [Edge; MAX_EDGES],
}

impl Solution {
    /// The `len == 0` sentinel: no edges need to be removed.
    pub const COLORABLE: Solution = Solution {
        len: 0,
        edges: [Edge { node1: 0, node2: 0 }; MAX_EDGES],
    };

    /// Builds a record from a candidate edge list, or `None` when the list
    /// does not fit into [`MAX_EDGES`] slots. Callers perform this check
    /// before touching the channel, so an oversized candidate never costs a
    /// semaphore acquisition.
    pub fn from_edges(candidate: &[Edge]) -> Option<Self> {
        if candidate.len() > MAX_EDGES {
            return None;
        }

        let mut solution = Self::COLORABLE;
        solution.len = candidate.len() as u32;
        solution.edges[..candidate.len()].copy_from_slice(candidate);

        Some(solution)
    }

    /// Number of edges this solution removes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// `true` for the "graph is 3-colorable" sentinel.
    pub fn is_colorable(&self) -> bool {
        self.len == 0
    }

    /// The valid prefix of the edge array.
    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.len as usize]
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        // Entries past `len` are unspecified and excluded from equality.
        self.len == other.len && self.edges() == other.edges()
    }
}

impl Eq for Solution {}
