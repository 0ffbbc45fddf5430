//! Immutable network produced by the assembler.

use std::ops::Range;

use rand::Rng;

use crate::{geometry::Position, graph::Graph, params::GeneratorParams, region::edge_ratio};

/// A network node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    /// Dense zero-based id.
    pub id: usize,
    /// Position assigned by the layout provider.
    pub position: Position,
    /// Whether the node supplies heat.
    pub is_producer: bool,
    /// Region the node was generated in; `None` for the central node.
    pub region: Option<usize>,
}

/// A pipe between two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pipe {
    /// Smaller endpoint id.
    pub source: usize,
    /// Larger endpoint id.
    pub target: usize,
    /// Positive pipe weight.
    pub weight: f64,
    /// Euclidean distance between the laid-out endpoints.
    pub length: f64,
    /// Inner diameter in metres.
    pub diameter: f64,
    /// Convective heat-transfer coefficient `h`.
    pub convective_coefficient: f64,
}

/// A generated region and the contiguous id range its nodes occupy.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Zero-based region index.
    pub id: usize,
    /// Anchor the region was seeded around.
    pub anchor: Position,
    /// Node ids belonging to the region.
    pub nodes: Range<usize>,
}

impl Region {
    /// Whether `node` belongs to the region.
    #[must_use]
    pub fn contains(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }
}

/// Derived statistics of a [`Topology`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopologyStats {
    /// Node count.
    pub nodes: usize,
    /// Pipe count.
    pub pipes: usize,
    /// `pipes / (nodes - 1)`.
    pub ratio: f64,
    /// Largest hop distance between two nodes.
    pub hop_diameter: usize,
    /// Connected components; one for every successful generation.
    pub components: usize,
    /// Producer count after pruning.
    pub producers: usize,
}

/// Generated district heating network.
///
/// Built once by [`crate::TopologyAssembler`] and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    nodes: Vec<Node>,
    pipes: Vec<Pipe>,
    regions: Vec<Region>,
    producers: Vec<usize>,
    graph: Graph,
}

impl Topology {
    /// Assembles the output view; `positions` must hold one entry per node.
    ///
    /// Each pipe draws its convective coefficient and then its diameter from
    /// `rng`, in `(source, target)` order.
    pub(crate) fn new<R: Rng + ?Sized>(
        graph: Graph,
        positions: &[Position],
        producers: Vec<usize>,
        regions: Vec<Region>,
        params: &GeneratorParams,
        rng: &mut R,
    ) -> Self {
        let position_of = |id: usize| positions.get(id).copied().unwrap_or_default();
        let nodes = (0..graph.node_count())
            .map(|id| Node {
                id,
                position: position_of(id),
                is_producer: producers.contains(&id),
                region: regions
                    .iter()
                    .find(|region| region.contains(id))
                    .map(|region| region.id),
            })
            .collect();
        let pipes = graph
            .edges()
            .map(|edge| {
                let convective_coefficient = params.convective_coefficient().sample(rng);
                Pipe {
                    source: edge.source,
                    target: edge.target,
                    weight: edge.weight,
                    length: position_of(edge.source).distance(position_of(edge.target)),
                    diameter: params.pipe_diameter().sample(rng),
                    convective_coefficient,
                }
            })
            .collect();
        Self {
            nodes,
            pipes,
            regions,
            producers,
            graph,
        }
    }

    /// Nodes ordered by id.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Pipes ordered by `(source, target)`.
    #[must_use]
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    /// Regions in generation order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Producer ids in discovery order.
    #[must_use]
    pub fn producers(&self) -> &[usize] {
        &self.producers
    }

    /// Underlying graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Node with the given id.
    #[must_use]
    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Shortest-path length in pipes between two nodes.
    #[must_use]
    pub fn hop_distance(&self, u: usize, v: usize) -> Option<usize> {
        self.graph.hop_distance(u, v)
    }

    /// Computes summary statistics.
    #[must_use]
    pub fn stats(&self) -> TopologyStats {
        TopologyStats {
            nodes: self.graph.node_count(),
            pipes: self.graph.edge_count(),
            ratio: edge_ratio(&self.graph),
            hop_diameter: self.graph.hop_diameter(),
            components: self.graph.component_count(),
            producers: self.producers.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::{params::GeneratorParamsBuilder, weights::PropertyRange};

    fn sample() -> Topology {
        sample_with(&GeneratorParams::default())
    }

    fn sample_with(params: &GeneratorParams) -> Topology {
        let mut graph = Graph::with_nodes(4);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(0, 2, 2.0);
        graph.add_edge(2, 3, 0.5);
        let positions = [
            Position::ORIGIN,
            Position::new(3.0, 4.0),
            Position::new(0.0, 1.0),
            Position::new(0.0, 2.0),
        ];
        let regions = vec![
            Region {
                id: 0,
                anchor: Position::new(-1.0, -1.0),
                nodes: 1..2,
            },
            Region {
                id: 1,
                anchor: Position::new(1.0, 1.0),
                nodes: 2..4,
            },
        ];
        let mut rng = SmallRng::seed_from_u64(9);
        Topology::new(graph, &positions, vec![0, 3], regions, params, &mut rng)
    }

    #[test]
    fn nodes_carry_region_and_producer_flags() {
        let topology = sample();
        let regions: Vec<_> = topology.nodes().iter().map(|node| node.region).collect();
        assert_eq!(regions, vec![None, Some(0), Some(1), Some(1)]);
        let producers: Vec<_> = topology
            .nodes()
            .iter()
            .filter(|node| node.is_producer)
            .map(|node| node.id)
            .collect();
        assert_eq!(producers, topology.producers());
    }

    #[test]
    fn pipes_measure_layout_distance() {
        let topology = sample();
        let lengths: Vec<_> = topology.pipes().iter().map(|pipe| pipe.length).collect();
        assert_eq!(lengths, vec![5.0, 1.0, 1.0]);
        assert_eq!(topology.pipes()[1].weight, 2.0);
    }

    #[test]
    fn pipe_properties_fall_inside_the_configured_ranges() {
        let params = GeneratorParams::default();
        let topology = sample_with(&params);
        for pipe in topology.pipes() {
            assert!(params.pipe_diameter().contains(pipe.diameter), "{pipe:?}");
            assert!(
                params.convective_coefficient().contains(pipe.convective_coefficient),
                "{pipe:?}"
            );
        }
    }

    #[test]
    fn degenerate_ranges_fix_pipe_properties() {
        let params = GeneratorParamsBuilder::new()
            .with_pipe_diameter(PropertyRange::new(0.2, 0.2))
            .with_convective_coefficient(PropertyRange::new(1.5, 1.5))
            .build()
            .expect("valid parameters");
        let topology = sample_with(&params);
        assert!(topology.pipes().iter().all(|pipe| pipe.diameter == 0.2));
        assert!(
            topology
                .pipes()
                .iter()
                .all(|pipe| pipe.convective_coefficient == 1.5)
        );
    }

    #[test]
    fn stats_summarise_the_graph() {
        let stats = sample().stats();
        assert_eq!(
            stats,
            TopologyStats {
                nodes: 4,
                pipes: 3,
                ratio: 1.0,
                hop_diameter: 3,
                components: 1,
                producers: 2,
            }
        );
    }
}
