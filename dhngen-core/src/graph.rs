//! Undirected weighted graph used as the working structure during assembly.
//!
//! Nodes are dense `usize` ids. Adjacency is kept in ordered maps so every
//! traversal visits neighbours in ascending id order, which keeps generation
//! reproducible under a fixed random sequence. The graph refuses self-loops
//! and parallel edges outright; callers learn about rejected insertions and
//! removals through [`EdgeInsertion`] and [`EdgeRemoval`].

use std::collections::{BTreeMap, VecDeque};

use crate::union_find::DisjointSet;

/// Outcome of [`Graph::add_edge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeInsertion {
    /// The edge was inserted.
    Added,
    /// The endpoints were already adjacent; the graph is unchanged.
    AlreadyPresent,
    /// Both endpoints were the same node; the graph is unchanged.
    SelfLoop,
    /// An endpoint is not a node of this graph; the graph is unchanged.
    UnknownNode,
}

impl EdgeInsertion {
    /// Whether the graph gained an edge.
    #[must_use]
    pub fn is_added(self) -> bool {
        self == Self::Added
    }
}

/// Outcome of [`Graph::remove_edge`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeRemoval {
    /// The edge existed and was removed; carries its weight for restoration.
    Removed {
        /// Weight of the removed edge.
        weight: f64,
    },
    /// No such edge exists.
    Missing,
}

/// An undirected edge in canonical form (`source < target`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Smaller endpoint.
    pub source: usize,
    /// Larger endpoint.
    pub target: usize,
    /// Positive edge weight.
    pub weight: f64,
}

/// Simple undirected graph with weighted edges.
///
/// # Examples
/// ```
/// use dhngen_core::{EdgeInsertion, Graph};
///
/// let mut graph = Graph::with_nodes(3);
/// assert_eq!(graph.add_edge(0, 1, 1.0), EdgeInsertion::Added);
/// assert_eq!(graph.add_edge(1, 0, 2.0), EdgeInsertion::AlreadyPresent);
/// assert_eq!(graph.add_edge(2, 2, 1.0), EdgeInsertion::SelfLoop);
/// assert!(!graph.is_connected());
/// graph.add_edge(1, 2, 1.5);
/// assert!(graph.is_connected());
/// assert_eq!(graph.hop_distance(0, 2), Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    adjacency: Vec<BTreeMap<usize, f64>>,
    edge_count: usize,
}

impl Graph {
    /// Creates a graph with `n` isolated nodes.
    #[must_use]
    pub fn with_nodes(n: usize) -> Self {
        Self {
            adjacency: vec![BTreeMap::new(); n],
            edge_count: 0,
        }
    }

    /// Number of nodes.
    #[must_use]
    #[rustfmt::skip]
    pub fn node_count(&self) -> usize { self.adjacency.len() }

    /// Number of edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_count(&self) -> usize { self.edge_count }

    /// Appends an isolated node and returns its id.
    pub fn add_node(&mut self) -> usize {
        self.adjacency.push(BTreeMap::new());
        self.adjacency.len() - 1
    }

    /// Inserts the undirected edge `{u, v}`.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> EdgeInsertion {
        if u >= self.node_count() || v >= self.node_count() {
            return EdgeInsertion::UnknownNode;
        }
        if u == v {
            return EdgeInsertion::SelfLoop;
        }
        if self.adjacency[u].contains_key(&v) {
            return EdgeInsertion::AlreadyPresent;
        }
        self.adjacency[u].insert(v, weight);
        self.adjacency[v].insert(u, weight);
        self.edge_count += 1;
        EdgeInsertion::Added
    }

    /// Removes the undirected edge `{u, v}`.
    pub fn remove_edge(&mut self, u: usize, v: usize) -> EdgeRemoval {
        let Some(weight) = self.adjacency.get_mut(u).and_then(|row| row.remove(&v)) else {
            return EdgeRemoval::Missing;
        };
        if let Some(row) = self.adjacency.get_mut(v) {
            row.remove(&u);
        }
        self.edge_count -= 1;
        EdgeRemoval::Removed { weight }
    }

    /// Whether `u` and `v` are adjacent.
    #[must_use]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency.get(u).is_some_and(|row| row.contains_key(&v))
    }

    /// Weight of the edge `{u, v}`, if present.
    #[must_use]
    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        self.adjacency.get(u).and_then(|row| row.get(&v)).copied()
    }

    /// Degree of `node`; zero for unknown ids.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.adjacency.get(node).map_or(0, BTreeMap::len)
    }

    /// Neighbours of `node` in ascending id order.
    pub fn neighbours(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|row| row.keys().copied())
    }

    /// Every edge once, in canonical form, ordered by `(source, target)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(source, row)| {
            row.range(source + 1..).map(move |(&target, &weight)| Edge {
                source,
                target,
                weight,
            })
        })
    }

    /// Appends a copy of `other`, shifting its ids by the current node count.
    ///
    /// Returns the offset applied, i.e. the id `other`'s node 0 received.
    pub fn extend_disjoint(&mut self, other: &Self) -> usize {
        let offset = self.node_count();
        self.adjacency.extend(other.adjacency.iter().map(|row| {
            row.iter()
                .map(|(&neighbour, &weight)| (neighbour + offset, weight))
                .collect::<BTreeMap<_, _>>()
        }));
        self.edge_count += other.edge_count;
        offset
    }

    /// Number of connected components; zero for the empty graph.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let mut components = DisjointSet::new(self.node_count());
        for edge in self.edges() {
            components.union(edge.source, edge.target);
        }
        components.components()
    }

    /// Whether the graph forms exactly one connected component.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.component_count() == 1
    }

    /// Breadth-first hop distances from `source`; `None` marks unreachable
    /// nodes. Unknown sources yield an all-`None` vector.
    #[must_use]
    pub fn hop_distances(&self, source: usize) -> Vec<Option<usize>> {
        let mut distances = vec![None; self.node_count()];
        let Some(slot) = distances.get_mut(source) else {
            return distances;
        };
        *slot = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let next = distances[node].map_or(0, |hops| hops + 1);
            for neighbour in self.neighbours(node) {
                if distances[neighbour].is_none() {
                    distances[neighbour] = Some(next);
                    queue.push_back(neighbour);
                }
            }
        }
        distances
    }

    /// Shortest-path length in edges between `u` and `v`.
    #[must_use]
    pub fn hop_distance(&self, u: usize, v: usize) -> Option<usize> {
        self.hop_distances(u).get(v).copied().flatten()
    }

    /// Largest finite hop distance between any two nodes.
    #[must_use]
    pub fn hop_diameter(&self) -> usize {
        (0..self.node_count())
            .filter_map(|node| self.hop_distances(node).into_iter().flatten().max())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn path(n: usize) -> Graph {
        let mut graph = Graph::with_nodes(n);
        for node in 1..n {
            graph.add_edge(node - 1, node, 1.0);
        }
        graph
    }

    #[test]
    fn rejects_parallel_edges_self_loops_and_unknown_nodes() {
        let mut graph = Graph::with_nodes(2);
        assert_eq!(graph.add_edge(0, 1, 1.0), EdgeInsertion::Added);
        assert_eq!(graph.add_edge(1, 0, 1.0), EdgeInsertion::AlreadyPresent);
        assert_eq!(graph.add_edge(1, 1, 1.0), EdgeInsertion::SelfLoop);
        assert_eq!(graph.add_edge(0, 9, 1.0), EdgeInsertion::UnknownNode);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.degree(0), 1);
    }

    #[test]
    fn remove_edge_reports_weight_then_missing() {
        let mut graph = path(3);
        graph.add_edge(0, 2, 2.5);
        assert_eq!(graph.remove_edge(2, 0), EdgeRemoval::Removed { weight: 2.5 });
        assert_eq!(graph.remove_edge(0, 2), EdgeRemoval::Missing);
        assert_eq!(graph.remove_edge(7, 0), EdgeRemoval::Missing);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.has_edge(2, 0));
    }

    #[test]
    fn edges_are_canonical_and_sorted() {
        let mut graph = Graph::with_nodes(4);
        graph.add_edge(3, 1, 1.0);
        graph.add_edge(2, 0, 2.0);
        graph.add_edge(1, 0, 3.0);
        let pairs: Vec<(usize, usize)> = graph.edges().map(|e| (e.source, e.target)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 3)]);
    }

    #[test]
    fn extend_disjoint_offsets_ids() {
        let mut graph = path(2);
        let offset = graph.extend_disjoint(&path(3));
        assert_eq!(offset, 2);
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.has_edge(2, 3));
        assert!(graph.has_edge(3, 4));
        assert_eq!(graph.component_count(), 2);
    }

    #[rstest]
    #[case::empty(0, 0)]
    #[case::single(1, 1)]
    #[case::path(5, 1)]
    fn component_count_of_paths(#[case] n: usize, #[case] expected: usize) {
        assert_eq!(path(n).component_count(), expected);
    }

    #[test]
    fn hop_distances_mark_unreachable_nodes() {
        let mut graph = path(3);
        graph.add_node();
        let distances = graph.hop_distances(0);
        assert_eq!(distances, vec![Some(0), Some(1), Some(2), None]);
        assert_eq!(graph.hop_distance(0, 3), None);
        assert!(graph.hop_distances(42).iter().all(Option::is_none));
    }

    #[test]
    fn hop_diameter_of_cycle() {
        let mut graph = path(6);
        graph.add_edge(5, 0, 1.0);
        assert_eq!(graph.hop_diameter(), 3);
    }
}
