//! Construction of a single bounded-degree region graph.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    connectivity::ConnectivityRepairer,
    error::{ConnectivityError, GenerationError, Result},
    geometry::Position,
    graph::Graph,
    params::GeneratorParams,
    weights::EdgeWeights,
};

/// A connected region graph ready to be merged into the network.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltRegion {
    /// Region graph with ids `0..size`.
    pub graph: Graph,
    /// Spatial anchor the region is placed around.
    pub anchor: Position,
    /// Achieved `edges / (nodes - 1)`.
    pub ratio: f64,
    /// Attempts spent, including the returned one.
    pub attempts: usize,
    /// Whether `ratio` landed within the configured tolerance.
    pub converged: bool,
}

/// Builds connected regions that approach a target edge/node ratio.
///
/// Each attempt grows a sparse random structure by walking a cursor over the
/// node ids, repairs connectivity under the degree cap, and measures the
/// resulting ratio. Attempts repeat until the ratio is within tolerance or the
/// attempt budget runs out, in which case the closest connected attempt is
/// returned.
#[derive(Clone, Debug)]
pub struct RegionBuilder {
    size: usize,
    max_degree: usize,
    jump_step: usize,
    target_ratio: f64,
    tolerance: f64,
    attempts: usize,
    repairer: ConnectivityRepairer,
    weights: EdgeWeights,
}

impl RegionBuilder {
    /// Creates a builder from validated parameters.
    #[must_use]
    pub fn new(params: &GeneratorParams) -> Self {
        let retry = params.retry();
        Self {
            size: params.nodes_per_region(),
            max_degree: params.max_degree(),
            jump_step: params.jump_step(),
            target_ratio: params.target_ratio(),
            tolerance: retry.ratio_tolerance,
            attempts: retry.region_attempts,
            repairer: ConnectivityRepairer::new(params.max_degree(), retry.connect_trials),
            weights: params.edge_weights(),
        }
    }

    /// Nodes per built region.
    #[must_use]
    #[rustfmt::skip]
    pub fn size(&self) -> usize { self.size }

    /// Builds the region with index `region` around `anchor`.
    ///
    /// # Errors
    /// Returns [`GenerationError::RegionUnconnectable`] when no attempt could
    /// be connected within the degree cap and trial budget.
    ///
    /// # Examples
    /// ```
    /// use dhngen_core::{GeneratorParamsBuilder, Position, RegionBuilder};
    /// use rand::{SeedableRng, rngs::SmallRng};
    ///
    /// let params = GeneratorParamsBuilder::new()
    ///     .with_nodes_per_region(30)
    ///     .build()
    ///     .expect("valid parameters");
    /// let mut rng = SmallRng::seed_from_u64(17);
    /// let region = RegionBuilder::new(&params)
    ///     .build(0, Position::new(1.0, 1.0), &mut rng)
    ///     .expect("region builds");
    /// assert_eq!(region.graph.node_count(), 30);
    /// assert!(region.graph.is_connected());
    /// ```
    #[instrument(
        name = "core.build_region",
        err,
        skip(self, rng),
        fields(
            region = region,
            size = self.size,
            max_degree = self.max_degree,
            target_ratio = self.target_ratio,
        ),
    )]
    pub fn build<R: Rng + ?Sized>(
        &self,
        region: usize,
        anchor: Position,
        rng: &mut R,
    ) -> Result<BuiltRegion> {
        let mut best: Option<(Graph, f64)> = None;
        let mut last_failure: Option<ConnectivityError> = None;

        for attempt in 1..=self.attempts {
            let mut graph = self.grow(rng);
            if let Err(err) = self.repairer.repair(&mut graph, rng, &self.weights) {
                debug!(attempt, %err, "region attempt could not be connected");
                last_failure = Some(err);
                continue;
            }

            let ratio = edge_ratio(&graph);
            if (ratio - self.target_ratio).abs() <= self.tolerance {
                debug!(attempt, ratio, "region converged");
                return Ok(BuiltRegion {
                    graph,
                    anchor,
                    ratio,
                    attempts: attempt,
                    converged: true,
                });
            }

            let closer = best.as_ref().is_none_or(|(_, best_ratio)| {
                (ratio - self.target_ratio).abs() < (best_ratio - self.target_ratio).abs()
            });
            if closer {
                best = Some((graph, ratio));
            }
        }

        match (best, last_failure) {
            (Some((graph, ratio)), _) => {
                debug!(
                    ratio,
                    target_ratio = self.target_ratio,
                    attempts = self.attempts,
                    "region ratio outside tolerance; keeping closest attempt"
                );
                Ok(BuiltRegion {
                    graph,
                    anchor,
                    ratio,
                    attempts: self.attempts,
                    converged: false,
                })
            }
            (None, Some(source)) => Err(GenerationError::RegionUnconnectable {
                region,
                attempts: self.attempts,
                source,
            }),
            (None, None) => Err(GenerationError::RegionUnconnectable {
                region,
                attempts: 0,
                source: ConnectivityError::TrialsExhausted {
                    trials: 0,
                    components: self.size,
                },
            }),
        }
    }

    /// Grows the sparse initial structure.
    ///
    /// The cursor visits `0, jump, 2 * jump, ...` modulo the region size and
    /// links each visited node to a random number of still-unassigned nodes.
    /// Every step consumes at least one pool entry, so the walk ends after at
    /// most `size` steps. A node drawn for itself is consumed without an edge.
    fn grow<R: Rng + ?Sized>(&self, rng: &mut R) -> Graph {
        let mut graph = Graph::with_nodes(self.size);
        let mut pool: Vec<usize> = (0..self.size).collect();
        let mut cursor = 0;

        while !pool.is_empty() {
            let out_degree = rng.gen_range(1..self.max_degree);
            for _ in 0..out_degree {
                if pool.is_empty() {
                    break;
                }
                let pick = pool.swap_remove(rng.gen_range(0..pool.len()));
                if pick != cursor {
                    graph.add_edge(cursor, pick, self.weights.sample(rng));
                }
            }
            cursor = (cursor + self.jump_step) % self.size;
        }

        graph
    }
}

/// `edges / (nodes - 1)`; zero for graphs with fewer than two nodes.
#[must_use]
pub fn edge_ratio(graph: &Graph) -> f64 {
    match graph.node_count() {
        0 | 1 => 0.0,
        nodes => graph.edge_count() as f64 / (nodes - 1) as f64,
    }
}
