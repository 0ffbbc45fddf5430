//! Multi-region assembly: the orchestration entry point of the crate.
//!
//! [`TopologyAssembler::assemble`] performs one attempt:
//!
//! 1. optionally seed a central producer at node 0;
//! 2. build every region, merge it into the network and wire it up;
//! 3. backfill producers towards the target count;
//! 4. densify with random inter-region pipes until connected;
//! 5. demote producers that sit too close to an earlier producer;
//! 6. break short cycles;
//! 7. lay the network out and freeze it into a [`Topology`].
//!
//! [`TopologyAssembler::generate`] repeats attempts that failed for
//! structural reasons until one succeeds or the attempt budget runs out.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::{
    cycles::CycleRepairer,
    error::{GenerationError, Result},
    geometry::Position,
    graph::Graph,
    layout::{ForceDirectedLayout, LayoutProvider, validate_layout},
    params::{GeneratorParams, GeneratorParamsBuilder},
    region::RegionBuilder,
    topology::{Region, Topology},
};

/// Network under construction within one assembly attempt.
#[derive(Debug, Default)]
struct Draft {
    graph: Graph,
    seeds: Vec<Position>,
    producers: Vec<usize>,
    regions: Vec<Region>,
    central: bool,
}

impl Draft {
    fn random_node_in<R: Rng + ?Sized>(&self, region: usize, rng: &mut R) -> Option<usize> {
        let nodes = self.regions.get(region)?.nodes.clone();
        (!nodes.is_empty()).then(|| rng.gen_range(nodes))
    }
}

/// Orchestrates region construction, merging, producer placement and layout.
///
/// # Examples
/// ```
/// use dhngen_core::{GeneratorParamsBuilder, TopologyAssembler};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let params = GeneratorParamsBuilder::new()
///     .with_region_count(3)
///     .with_nodes_per_region(20)
///     .build()
///     .expect("valid parameters");
/// let mut rng = SmallRng::seed_from_u64(42);
/// let topology = TopologyAssembler::new(params)
///     .generate(&mut rng)
///     .expect("generation succeeds");
/// assert_eq!(topology.stats().components, 1);
/// ```
#[derive(Clone, Debug)]
pub struct TopologyAssembler<L: LayoutProvider = ForceDirectedLayout> {
    params: GeneratorParams,
    layout: L,
}

impl TopologyAssembler {
    /// Creates an assembler using the default force-directed layout.
    #[must_use]
    pub fn new(params: GeneratorParams) -> Self {
        Self {
            params,
            layout: ForceDirectedLayout::default(),
        }
    }

    /// Validates `builder` and creates an assembler from the result.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParams`] when validation fails.
    pub fn from_builder(builder: GeneratorParamsBuilder) -> Result<Self> {
        Ok(Self::new(builder.build()?))
    }
}

impl<L: LayoutProvider> TopologyAssembler<L> {
    /// Replaces the layout provider.
    #[must_use]
    pub fn with_layout<M: LayoutProvider>(self, layout: M) -> TopologyAssembler<M> {
        TopologyAssembler {
            params: self.params,
            layout,
        }
    }

    /// Parameters driving generation.
    #[must_use]
    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Configured layout provider.
    #[must_use]
    pub fn layout_provider(&self) -> &L {
        &self.layout
    }

    /// Runs [`Self::assemble`] until an attempt succeeds.
    ///
    /// Only recoverable failures (see [`GenerationError::is_recoverable`])
    /// are retried; every retry starts from scratch.
    ///
    /// # Errors
    /// Returns [`GenerationError::RetriesExhausted`] once the attempt budget
    /// is spent, or the first non-recoverable error.
    #[instrument(
        name = "core.generate",
        err,
        skip(self, rng),
        fields(
            regions = self.params.region_count(),
            nodes_per_region = self.params.nodes_per_region(),
            max_attempts = self.params.retry().assembly_attempts,
        ),
    )]
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Topology> {
        let attempts = self.params.retry().assembly_attempts;
        for attempt in 1..=attempts {
            match self.assemble(rng) {
                Ok(topology) => {
                    info!(attempt, "network generated");
                    return Ok(topology);
                }
                Err(err) if err.is_recoverable() => {
                    warn!(attempt, code = %err.code(), %err, "assembly attempt failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }
        Err(GenerationError::RetriesExhausted { attempts })
    }

    /// Performs a single assembly attempt.
    ///
    /// # Errors
    /// Returns [`GenerationError::RegionUnconnectable`] when a region cannot
    /// be connected, [`GenerationError::Disconnected`] when densification
    /// leaves several components, and [`GenerationError::Layout`] when the
    /// layout provider fails.
    #[instrument(
        name = "core.assemble",
        err,
        skip(self, rng),
        fields(
            regions = self.params.region_count(),
            nodes_per_region = self.params.nodes_per_region(),
            producer_target = self.params.producer_target(),
        ),
    )]
    pub fn assemble<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Topology> {
        let mut draft = Draft::default();
        self.seed_central(&mut draft, rng);
        self.add_regions(&mut draft, rng)?;
        self.backfill_producers(&mut draft, rng);
        self.densify(&mut draft, rng)?;
        self.prune_producers(&mut draft);

        let cycles =
            CycleRepairer::new(self.params.min_cycle_length()).remove_short_cycles(&mut draft.graph);
        debug!(
            broken = cycles.broken(),
            kept = cycles.kept(),
            "short cycles repaired"
        );

        let diameter = draft.graph.hop_diameter();
        if diameter > self.params.max_diameter() {
            warn!(
                diameter,
                max_diameter = self.params.max_diameter(),
                "network exceeds the advisory diameter"
            );
        }

        let positions = self.lay_out(&draft.graph, &draft.seeds)?;
        let topology = Topology::new(
            draft.graph,
            &positions,
            draft.producers,
            draft.regions,
            &self.params,
            rng,
        );
        let stats = topology.stats();
        info!(
            nodes = stats.nodes,
            pipes = stats.pipes,
            producers = stats.producers,
            hop_diameter = stats.hop_diameter,
            "network assembled"
        );
        Ok(topology)
    }

    fn seed_central<R: Rng + ?Sized>(&self, draft: &mut Draft, rng: &mut R) {
        if !rng.gen_bool(self.params.central_producer_probability()) {
            return;
        }
        let node = draft.graph.add_node();
        draft.seeds.push(Position::new(
            rng.gen_range(-1.0..2.0),
            rng.gen_range(-1.0..2.0),
        ));
        draft.producers.push(node);
        draft.central = true;
        debug!(node, "central producer seeded");
    }

    fn add_regions<R: Rng + ?Sized>(&self, draft: &mut Draft, rng: &mut R) -> Result<()> {
        let builder = RegionBuilder::new(&self.params);
        let weights = self.params.edge_weights();

        for index in 0..self.params.region_count() {
            let anchor = self.params.anchor_for(index);
            let built = builder.build(index, anchor, rng)?;
            let offset = draft.graph.extend_disjoint(&built.graph);
            let size = built.graph.node_count();
            let centre = anchor * 2.0;
            draft.seeds.extend((0..size).map(|_| {
                centre + Position::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
            }));
            draft.regions.push(Region {
                id: index,
                anchor,
                nodes: offset..offset + size,
            });

            // The first region never receives a dedicated producer.
            if index != 0
                && rng.gen_bool(self.params.region_producer_probability())
                && draft.producers.len() < self.params.producer_target()
            {
                let producer = rng.gen_range(offset..offset + size);
                draft.producers.push(producer);
                debug!(region = index, producer, "region producer selected");
            }

            let link = if draft.central {
                draft.random_node_in(index, rng).map(|node| (0, node))
            } else if index != 0 {
                let earlier = rng.gen_range(0..index);
                draft
                    .random_node_in(index, rng)
                    .zip(draft.random_node_in(earlier, rng))
            } else {
                None
            };
            if let Some((u, v)) = link {
                draft.graph.add_edge(u, v, weights.sample(rng));
            }
        }
        Ok(())
    }

    fn backfill_producers<R: Rng + ?Sized>(&self, draft: &mut Draft, rng: &mut R) {
        let boundary = self.params.backfill();
        let target = self.params.producer_target();
        while boundary.wants_more(draft.producers.len(), target) {
            let candidates: Vec<usize> = (0..draft.graph.node_count())
                .filter(|node| !draft.producers.contains(node))
                .collect();
            if candidates.is_empty() {
                break;
            }
            let producer = candidates[rng.gen_range(0..candidates.len())];
            draft.producers.push(producer);
            debug!(producer, "producer backfilled");
        }
    }

    fn densify<R: Rng + ?Sized>(&self, draft: &mut Draft, rng: &mut R) -> Result<()> {
        let probability = self.params.inter_region_pipe_probability();
        let weights = self.params.edge_weights();
        let budget = self.params.retry().densify_passes;
        let region_count = draft.regions.len();
        let mut added = 0;

        for pass in 1..=budget {
            for first in 0..region_count {
                for second in (first + 1)..region_count {
                    if !rng.gen_bool(probability) {
                        continue;
                    }
                    let pair = draft
                        .random_node_in(first, rng)
                        .zip(draft.random_node_in(second, rng));
                    if let Some((u, v)) = pair
                        && draft.graph.add_edge(u, v, weights.sample(rng)).is_added()
                    {
                        added += 1;
                    }
                }
            }
            if draft.graph.is_connected() {
                debug!(passes = pass, added, "network connected");
                return Ok(());
            }
        }

        Err(GenerationError::Disconnected {
            components: draft.graph.component_count(),
            passes: budget,
        })
    }

    /// Demotes the later producer of every pair closer than the minimum.
    ///
    /// Close pairs are collected over all producers before any demotion, so
    /// a demoted producer still demotes the producers discovered after it.
    fn prune_producers(&self, draft: &mut Draft) {
        let min_distance = self.params.min_producer_distance();
        let producers = &draft.producers;
        let mut demoted = vec![false; producers.len()];

        for (i, &earlier) in producers.iter().enumerate() {
            let distances = draft.graph.hop_distances(earlier);
            for (j, &later) in producers.iter().enumerate().skip(i + 1) {
                if let Some(&Some(hops)) = distances.get(later)
                    && hops < min_distance
                {
                    demoted[j] = true;
                    debug!(kept = earlier, demoted = later, hops, "producer demoted");
                }
            }
        }

        let retained: Vec<usize> = producers
            .iter()
            .zip(&demoted)
            .filter(|&(_, &dropped)| !dropped)
            .map(|(&producer, _)| producer)
            .collect();
        draft.producers = retained;
    }

    #[instrument(
        name = "core.layout",
        err,
        skip_all,
        fields(provider = self.layout.name(), nodes = graph.node_count()),
    )]
    fn lay_out(&self, graph: &Graph, seeds: &[Position]) -> Result<Vec<Position>> {
        self.layout
            .layout(graph, seeds)
            .and_then(|positions| validate_layout(graph, &positions).map(|()| positions))
            .map_err(|source| GenerationError::Layout {
                provider: Arc::from(self.layout.name()),
                source,
            })
    }
}
