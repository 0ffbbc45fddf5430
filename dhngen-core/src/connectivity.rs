//! Randomised connectivity repair under a degree cap.
//!
//! Shared by region construction and topology assembly. Each trial draws two
//! distinct nodes whose degree is below the cap and links them when they are
//! not adjacent yet. Components are tracked incrementally so a trial never
//! rescans the whole graph.

use rand::Rng;
use tracing::debug;

use crate::{
    error::ConnectivityError,
    graph::Graph,
    union_find::DisjointSet,
    weights::EdgeWeights,
};

/// Summary of a successful repair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Edges inserted by the repair.
    pub edges_added: usize,
    /// Random pair draws performed.
    pub trials: usize,
}

/// Restores connectivity by inserting random edges between under-cap nodes.
///
/// # Examples
/// ```
/// use dhngen_core::{ConnectivityRepairer, EdgeWeights, Graph};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut graph = Graph::with_nodes(6);
/// let mut rng = SmallRng::seed_from_u64(5);
/// let report = ConnectivityRepairer::new(5, 10_000)
///     .repair(&mut graph, &mut rng, &EdgeWeights::new(1.5, 0.2))
///     .expect("six isolated nodes can always be joined under a cap of five");
/// assert!(graph.is_connected());
/// assert_eq!(report.edges_added, graph.edge_count());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectivityRepairer {
    max_degree: usize,
    max_trials: usize,
}

impl ConnectivityRepairer {
    /// Creates a repairer that never raises a node's degree past
    /// `max_degree` and gives up after `max_trials` draws.
    #[must_use]
    pub const fn new(max_degree: usize, max_trials: usize) -> Self {
        Self {
            max_degree,
            max_trials,
        }
    }

    /// Degree cap honoured by inserted edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_degree(&self) -> usize { self.max_degree }

    /// Draw budget per call to [`Self::repair`].
    #[must_use]
    #[rustfmt::skip]
    pub fn max_trials(&self) -> usize { self.max_trials }

    /// Adds random edges to `graph` until it forms a single component.
    ///
    /// Graphs that are already connected (or empty) are returned untouched
    /// with an all-zero report.
    ///
    /// # Errors
    /// Returns [`ConnectivityError::NoConnectablePair`] when every pair of
    /// under-cap nodes is already adjacent (or fewer than two remain), and
    /// [`ConnectivityError::TrialsExhausted`] once the draw budget is spent.
    pub fn repair<R: Rng + ?Sized>(
        &self,
        graph: &mut Graph,
        rng: &mut R,
        weights: &EdgeWeights,
    ) -> Result<RepairReport, ConnectivityError> {
        let mut components = DisjointSet::new(graph.node_count());
        for edge in graph.edges() {
            components.union(edge.source, edge.target);
        }

        let mut eligible: Vec<usize> = (0..graph.node_count())
            .filter(|&node| graph.degree(node) < self.max_degree)
            .collect();
        let mut report = RepairReport::default();

        while components.components() > 1 {
            if eligible.len() < 2 {
                return Err(ConnectivityError::NoConnectablePair {
                    components: components.components(),
                });
            }
            if report.trials == self.max_trials {
                debug!(
                    trials = report.trials,
                    components = components.components(),
                    "connectivity repair ran out of trials"
                );
                return Err(ConnectivityError::TrialsExhausted {
                    trials: report.trials,
                    components: components.components(),
                });
            }
            report.trials += 1;

            let first = rng.gen_range(0..eligible.len());
            let mut second = rng.gen_range(0..eligible.len() - 1);
            if second >= first {
                second += 1;
            }
            let (u, v) = (eligible[first], eligible[second]);

            if graph.has_edge(u, v) {
                if !has_open_pair(graph, &eligible) {
                    return Err(ConnectivityError::NoConnectablePair {
                        components: components.components(),
                    });
                }
                continue;
            }

            if graph.add_edge(u, v, weights.sample(rng)).is_added() {
                components.union(u, v);
                report.edges_added += 1;
                eligible.retain(|&node| graph.degree(node) < self.max_degree);
            }
        }

        Ok(report)
    }
}

/// Whether any two nodes of `eligible` are still non-adjacent.
fn has_open_pair(graph: &Graph, eligible: &[usize]) -> bool {
    eligible.iter().any(|&node| {
        let linked = graph
            .neighbours(node)
            .filter(|neighbour| eligible.binary_search(neighbour).is_ok())
            .count();
        linked + 1 < eligible.len()
    })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    use super::*;

    fn weights() -> EdgeWeights {
        EdgeWeights::new(1.5, 0.2)
    }

    #[rstest]
    #[case(2, 3)]
    #[case(10, 4)]
    #[case(50, 4)]
    fn joins_isolated_nodes_within_the_cap(#[case] nodes: usize, #[case] cap: usize) {
        let mut graph = Graph::with_nodes(nodes);
        let mut rng = SmallRng::seed_from_u64(nodes as u64);
        let report = ConnectivityRepairer::new(cap, 100_000)
            .repair(&mut graph, &mut rng, &weights())
            .expect("repair must succeed");
        assert!(graph.is_connected());
        assert_eq!(report.edges_added, graph.edge_count());
        assert!(report.trials >= report.edges_added);
        assert!((0..nodes).all(|node| graph.degree(node) <= cap));
        assert!(graph.edges().all(|edge| edge.weight > 0.0));
    }

    #[test]
    fn connected_graph_is_untouched() {
        let mut graph = Graph::with_nodes(3);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 2, 1.0);
        let before = graph.clone();
        let mut rng = SmallRng::seed_from_u64(1);
        let report = ConnectivityRepairer::new(3, 10)
            .repair(&mut graph, &mut rng, &weights())
            .expect("already connected");
        assert_eq!(report, RepairReport::default());
        assert_eq!(graph, before);
    }

    #[test]
    fn saturated_nodes_report_no_connectable_pair() {
        // Two disjoint edges with a cap of one leave nobody eligible.
        let mut graph = Graph::with_nodes(4);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(2, 3, 1.0);
        let mut rng = SmallRng::seed_from_u64(2);
        let err = ConnectivityRepairer::new(1, 10)
            .repair(&mut graph, &mut rng, &weights())
            .expect_err("no node may gain an edge");
        assert_eq!(err, ConnectivityError::NoConnectablePair { components: 2 });
    }

    #[test]
    fn adjacent_eligible_pair_reports_no_connectable_pair() {
        // Nodes 0 and 1 are the only under-cap nodes and already share an edge.
        let mut graph = Graph::with_nodes(5);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(2, 3, 1.0);
        graph.add_edge(3, 4, 1.0);
        graph.add_edge(2, 4, 1.0);
        let mut rng = SmallRng::seed_from_u64(3);
        let err = ConnectivityRepairer::new(2, 1_000)
            .repair(&mut graph, &mut rng, &weights())
            .expect_err("the only eligible pair is adjacent");
        assert_eq!(err, ConnectivityError::NoConnectablePair { components: 2 });
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn exhausted_trial_budget_is_reported() {
        let mut graph = Graph::with_nodes(40);
        let mut rng = SmallRng::seed_from_u64(4);
        let err = ConnectivityRepairer::new(3, 5)
            .repair(&mut graph, &mut rng, &weights())
            .expect_err("five draws cannot join forty nodes");
        assert!(matches!(
            err,
            ConnectivityError::TrialsExhausted { trials: 5, components } if components > 1
        ));
    }
}
