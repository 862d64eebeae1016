//! Node bookkeeping, adjacency and the randomized coloring heuristic

use crate::edge::Edge;
use crate::error::{GraphError, Result};
use crate::COLOR_COUNT;
use rand::Rng;
use tracing::debug;

/// An undirected graph built from the operator's edge list.
///
/// Node ids are arbitrary non-negative integers; they are deduplicated in
/// first-seen order and addressed internally by dense indices. Duplicate
/// edges collapse into one.
pub struct Graph {
    /// Node ids in first-seen order
    nodes: Vec<i32>,
    /// Edges as index pairs into `nodes`
    edges: Vec<(usize, usize)>,
}

impl Graph {
    pub fn from_edges(input: &[Edge]) -> Result<Self> {
        if input.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut nodes: Vec<i32> = Vec::new();
        let index_of = |nodes: &mut Vec<i32>, id: i32| -> usize {
            match nodes.iter().position(|&n| n == id) {
                Some(index) => index,
                None => {
                    nodes.push(id);
                    nodes.len() - 1
                }
            }
        };

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for edge in input {
            let a = index_of(&mut nodes, edge.node1);
            let b = index_of(&mut nodes, edge.node2);

            let pair = if a <= b { (a, b) } else { (b, a) };
            if !edges.contains(&pair) {
                edges.push(pair);
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "graph constructed"
        );

        Ok(Self { nodes, edges })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// One heuristic round: color every node uniformly at random with one of
    /// three colors and collect the edges whose endpoints collide.
    ///
    /// Removing the returned edges leaves a properly 3-colored graph (the
    /// random assignment itself is a witness), so every candidate is valid;
    /// the generator keeps rolling until a small one shows up.
    pub fn random_candidate<R: Rng>(&self, rng: &mut R) -> Vec<Edge> {
        let colors: Vec<u8> = self
            .nodes
            .iter()
            .map(|_| rng.gen_range(0..COLOR_COUNT))
            .collect();

        self.edges
            .iter()
            .filter(|(a, b)| colors[*a] == colors[*b])
            .map(|&(a, b)| Edge::new(self.nodes[a], self.nodes[b]))
            .collect()
    }
}
