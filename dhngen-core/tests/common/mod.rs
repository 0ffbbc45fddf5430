#![expect(
    dead_code,
    reason = "each integration test binary uses a subset of the shared helpers"
)]

use dhngen_core::{GeneratorParamsBuilder, Graph, Topology};
use dhngen_test_support::profile::PropertyProfile;
use proptest::test_runner::Config as ProptestConfig;
use rand::{SeedableRng, rngs::SmallRng};

/// Proptest configuration honouring the shared `PROGTEST_CASES` and
/// `DHNGEN_PBT_FORK` overrides.
#[must_use]
pub fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = PropertyProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

#[must_use]
pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Small network that still exercises every assembly phase.
#[must_use]
pub fn compact_params() -> GeneratorParamsBuilder {
    GeneratorParamsBuilder::new()
        .with_region_count(4)
        .with_nodes_per_region(30)
}

/// Counts simple cycles with at most `max_len` edges, each exactly once.
#[must_use]
pub fn count_short_cycles(graph: &Graph, max_len: usize) -> usize {
    fn walk(
        graph: &Graph,
        start: usize,
        node: usize,
        path: &mut Vec<usize>,
        max_len: usize,
        found: &mut usize,
    ) {
        for next in graph.neighbours(node) {
            if next == start && path.len() >= 3 {
                *found += 1;
            } else if next > start && !path.contains(&next) && path.len() < max_len {
                path.push(next);
                walk(graph, start, next, path, max_len, found);
                path.pop();
            }
        }
    }

    let mut found = 0;
    for start in 0..graph.node_count() {
        let mut path = vec![start];
        walk(graph, start, start, &mut path, max_len, &mut found);
    }
    // Every cycle is walked once per direction.
    found / 2
}

/// Pipes whose endpoints lie in two different regions.
#[must_use]
pub fn inter_region_pipes(topology: &Topology) -> usize {
    topology
        .pipes()
        .iter()
        .filter(|pipe| {
            let source = topology.node(pipe.source).and_then(|node| node.region);
            let target = topology.node(pipe.target).and_then(|node| node.region);
            matches!((source, target), (Some(a), Some(b)) if a != b)
        })
        .count()
}
