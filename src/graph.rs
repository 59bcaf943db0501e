//! The proximity graph container (§4.2).
//!
//! Nodes hold only point indices, never references to other nodes or to the
//! point store — this keeps the graph self-contained, acyclic in the Rust
//! ownership sense, and trivially serializable (§9, "Ownership of nodes").

use crate::error::{Result, VamanaError};
use rand::Rng;
use std::collections::HashSet;

/// A single graph node: a stable index plus a duplicate-free, order-preserving
/// adjacency list.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// The node's own index; always equal to its position in the graph.
    pub index: usize,
    neighbors: Vec<usize>,
}

impl Node {
    fn new(index: usize) -> Self {
        Self { index, neighbors: Vec::new() }
    }

    /// Read-only view of this node's out-neighbors, in insertion order.
    #[must_use]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }
}

/// A fixed-size directed graph over `0..N` point indices.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Allocates a graph of `n` nodes, each with empty adjacency.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { nodes: (0..n).map(Node::new).collect() }
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Read-only access to the i-th node.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if `i >= self.size()`.
    pub fn node(&self, i: usize) -> Result<&Node> {
        self.nodes.get(i).ok_or(VamanaError::OutOfRange { index: i, len: self.nodes.len() })
    }

    /// Appends `j` to `i`'s adjacency if it isn't already present and `i != j`.
    ///
    /// Returns whether an edge was added.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if either index is out of bounds.
    pub fn connect(&mut self, i: usize, j: usize) -> Result<bool> {
        let len = self.nodes.len();
        if i >= len || j >= len {
            return Err(VamanaError::OutOfRange { index: i.max(j), len });
        }
        if i == j {
            return Ok(false);
        }
        let node = &mut self.nodes[i];
        if node.neighbors.contains(&j) {
            return Ok(false);
        }
        node.neighbors.push(j);
        Ok(true)
    }

    /// Removes `j` from `i`'s adjacency if present.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if `i` is out of bounds.
    pub fn disconnect(&mut self, i: usize, j: usize) -> Result<()> {
        let len = self.nodes.len();
        let node = self.nodes.get_mut(i).ok_or(VamanaError::OutOfRange { index: i, len })?;
        node.neighbors.retain(|&n| n != j);
        Ok(())
    }

    /// Empties `i`'s adjacency list.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if `i` is out of bounds.
    pub fn clear_neighbors(&mut self, i: usize) -> Result<()> {
        let len = self.nodes.len();
        let node = self.nodes.get_mut(i).ok_or(VamanaError::OutOfRange { index: i, len })?;
        node.neighbors.clear();
        Ok(())
    }

    /// Replaces `i`'s adjacency in bulk, as used by RobustPrune (§4.6).
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if `i` is out of bounds.
    pub fn replace_neighbors(&mut self, i: usize, list: Vec<usize>) -> Result<()> {
        let len = self.nodes.len();
        let node = self.nodes.get_mut(i).ok_or(VamanaError::OutOfRange { index: i, len })?;
        debug_assert!(!list.contains(&i), "adjacency must not contain the node itself");
        node.neighbors = list;
        Ok(())
    }

    /// Seeds every node with `r` distinct random out-neighbors, excluding
    /// itself (§4.7 step 2, the "random R-regular" seed used by unfiltered
    /// and, with `-connection-mode filled`, filtered Vamana).
    ///
    /// Draw order is preserved in the resulting adjacency list rather than
    /// routed through a hash-based set: `HashSet`'s iteration order depends
    /// on per-instance hasher state, not just content, which would make two
    /// builds with an identical RNG seed disagree on neighbor order (§5,
    /// §8 property 6).
    pub fn seed_random_regular<R: Rng + ?Sized>(&mut self, r: usize, rng: &mut R) {
        let n = self.nodes.len();
        if n <= 1 {
            return;
        }
        for i in 0..n {
            let target = r.min(n - 1);
            let mut seen: HashSet<usize> = HashSet::with_capacity(target);
            let mut chosen = Vec::with_capacity(target);
            while chosen.len() < target {
                let candidate = rng.random_range(0..n);
                if candidate != i && seen.insert(candidate) {
                    chosen.push(candidate);
                }
            }
            self.nodes[i].neighbors = chosen;
        }
    }
}
