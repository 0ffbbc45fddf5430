//! Best-effort elimination of short cycles.
//!
//! Detection runs a breadth-first search from every node and keeps the first
//! cycle through it, so the pass is a heuristic: it never introduces cycles
//! but may miss short cycles that are never the first one found. Each
//! detected cycle is rotated into a canonical orientation and deduplicated by
//! its starting edge. Edges are only removed while the graph stays connected.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, instrument};

use crate::graph::{EdgeRemoval, Graph};

/// A simple cycle stored as its node sequence.
///
/// The sequence starts at the smallest node id and continues towards the
/// smaller of that node's two cycle neighbours, so the same cycle found from
/// different nodes compares equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycle {
    nodes: Vec<usize>,
}

impl Cycle {
    fn canonical(mut nodes: Vec<usize>) -> Self {
        let start = nodes
            .iter()
            .enumerate()
            .min_by_key(|&(_, &node)| node)
            .map_or(0, |(idx, _)| idx);
        nodes.rotate_left(start);
        if let (Some(&second), Some(&last)) = (nodes.get(1), nodes.last())
            && last < second
        {
            nodes[1..].reverse();
        }
        Self { nodes }
    }

    /// Nodes in traversal order.
    #[must_use]
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Number of edges, equal to the number of nodes.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.len()
    }

    /// The first edge of the traversal, used as the deduplication key.
    #[must_use]
    pub fn starting_edge(&self) -> (usize, usize) {
        match self.nodes.as_slice() {
            [first, second, ..] => (*first, *second),
            _ => (0, 0),
        }
    }

    /// Edges in traversal order, closing back on the first node.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes
            .iter()
            .zip(self.nodes.iter().cycle().skip(1))
            .map(|(&u, &v)| (u, v))
    }
}

/// Result of searching for a cycle through one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleSearch {
    /// A cycle through the node.
    Found(Cycle),
    /// The node lies on no cycle (it is only reachable through bridges).
    NoCycle,
}

/// What happened to one short cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// `edge` was removed and the graph stayed connected.
    Broken {
        /// Removed edge as `(u, v)` in traversal order.
        edge: (usize, usize),
    },
    /// An edge of the cycle had already been removed for an earlier cycle.
    AlreadyBroken,
    /// Every removal would have disconnected the graph.
    Kept,
}

/// Totals for one [`CycleRepairer::remove_short_cycles`] pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleRepairReport {
    /// Nodes through which no cycle exists.
    pub acyclic_nodes: usize,
    /// Distinct cycles detected.
    pub cycles_found: usize,
    /// Outcome per short cycle, in detection order.
    pub outcomes: Vec<CycleOutcome>,
}

impl CycleRepairReport {
    /// Short cycles examined.
    #[must_use]
    pub fn short_cycles(&self) -> usize {
        self.outcomes.len()
    }

    /// Edges removed by the pass.
    pub fn removed_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            CycleOutcome::Broken { edge } => Some(*edge),
            _ => None,
        })
    }

    fn count(&self, wanted: fn(&CycleOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| wanted(outcome)).count()
    }

    /// Cycles broken by this pass.
    #[must_use]
    pub fn broken(&self) -> usize {
        self.count(|outcome| matches!(outcome, CycleOutcome::Broken { .. }))
    }

    /// Cycles already broken by an earlier removal.
    #[must_use]
    pub fn already_broken(&self) -> usize {
        self.count(|outcome| matches!(outcome, CycleOutcome::AlreadyBroken))
    }

    /// Cycles left in place.
    #[must_use]
    pub fn kept(&self) -> usize {
        self.count(|outcome| matches!(outcome, CycleOutcome::Kept))
    }
}

/// Removes cycles with at most `min_length` edges.
///
/// # Examples
/// ```
/// use dhngen_core::{CycleRepairer, Graph};
///
/// let mut graph = Graph::with_nodes(4);
/// for (u, v) in [(0, 1), (1, 2), (2, 0), (2, 3)] {
///     graph.add_edge(u, v, 1.0);
/// }
/// let report = CycleRepairer::new(3).remove_short_cycles(&mut graph);
/// assert_eq!(report.broken(), 1);
/// assert_eq!(graph.edge_count(), 3);
/// assert!(graph.is_connected());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleRepairer {
    min_length: usize,
}

impl CycleRepairer {
    /// Creates a repairer targeting cycles of at most `min_length` edges.
    #[must_use]
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Detects cycles on the current graph, then breaks the short ones.
    #[instrument(
        name = "core.remove_short_cycles",
        skip(self, graph),
        fields(
            min_length = self.min_length,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
        ),
    )]
    pub fn remove_short_cycles(&self, graph: &mut Graph) -> CycleRepairReport {
        let mut report = CycleRepairReport::default();
        let mut seen = BTreeSet::new();
        let mut cycles = Vec::new();

        for node in 0..graph.node_count() {
            match find_cycle_through(graph, node) {
                CycleSearch::NoCycle => report.acyclic_nodes += 1,
                CycleSearch::Found(cycle) => {
                    if seen.insert(cycle.starting_edge()) {
                        cycles.push(cycle);
                    }
                }
            }
        }
        report.cycles_found = cycles.len();

        for cycle in cycles
            .iter()
            .filter(|cycle| cycle.edge_count() <= self.min_length)
        {
            let outcome = break_cycle(graph, cycle);
            debug!(cycle = ?cycle.nodes(), ?outcome, "short cycle processed");
            report.outcomes.push(outcome);
        }

        debug!(
            cycles = report.cycles_found,
            short = report.short_cycles(),
            broken = report.broken(),
            already_broken = report.already_broken(),
            kept = report.kept(),
            "short cycle pass finished"
        );
        report
    }
}

fn break_cycle(graph: &mut Graph, cycle: &Cycle) -> CycleOutcome {
    if cycle.edges().any(|(u, v)| !graph.has_edge(u, v)) {
        return CycleOutcome::AlreadyBroken;
    }
    for (u, v) in cycle.edges() {
        if let EdgeRemoval::Removed { weight } = graph.remove_edge(u, v) {
            if graph.is_connected() {
                return CycleOutcome::Broken { edge: (u, v) };
            }
            graph.add_edge(u, v, weight);
        }
    }
    CycleOutcome::Kept
}

/// Finds one cycle through `source` by breadth-first search.
///
/// Every node reached is labelled with the neighbour of `source` it descends
/// from. The first edge joining two different labels closes a cycle through
/// `source`; no such edge means `source` lies on no cycle.
#[must_use]
pub fn find_cycle_through(graph: &Graph, source: usize) -> CycleSearch {
    let n = graph.node_count();
    if source >= n {
        return CycleSearch::NoCycle;
    }

    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut branch: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();
    for first in graph.neighbours(source) {
        parent[first] = Some(source);
        branch[first] = Some(first);
        queue.push_back(first);
    }

    while let Some(node) = queue.pop_front() {
        for next in graph.neighbours(node) {
            if next == source || parent[node] == Some(next) {
                continue;
            }
            match branch[next] {
                None => {
                    parent[next] = Some(node);
                    branch[next] = branch[node];
                    queue.push_back(next);
                }
                Some(label) if Some(label) != branch[node] => {
                    let mut nodes = path_from_source(&parent, source, node);
                    let mut back = path_from_source(&parent, source, next);
                    back.reverse();
                    back.pop();
                    nodes.extend(back);
                    return CycleSearch::Found(Cycle::canonical(nodes));
                }
                Some(_) => {}
            }
        }
    }

    CycleSearch::NoCycle
}

/// `[source, ..., node]` following the BFS parent links.
fn path_from_source(parent: &[Option<usize>], source: usize, node: usize) -> Vec<usize> {
    let mut path = vec![node];
    let mut current = node;
    while let Some(up) = parent[current] {
        path.push(up);
        if up == source {
            break;
        }
        current = up;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn graph_from(n: usize, edges: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::with_nodes(n);
        for &(u, v) in edges {
            graph.add_edge(u, v, 1.0);
        }
        graph
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn triangle_is_found_identically_from_every_node(#[case] source: usize) {
        let graph = graph_from(3, &[(0, 1), (1, 2), (2, 0)]);
        let CycleSearch::Found(cycle) = find_cycle_through(&graph, source) else {
            panic!("triangle must be found");
        };
        assert_eq!(cycle.nodes(), &[0, 1, 2]);
        assert_eq!(cycle.starting_edge(), (0, 1));
        assert_eq!(cycle.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn pendant_node_has_no_cycle() {
        let graph = graph_from(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        assert_eq!(find_cycle_through(&graph, 3), CycleSearch::NoCycle);
        assert_eq!(find_cycle_through(&graph, 9), CycleSearch::NoCycle);
    }

    #[test]
    fn found_cycle_passes_through_the_source() {
        // Square 0-1-2-3 with a tail 3-4-5 closing a triangle 3-4-5.
        let graph = graph_from(6, &[(0, 1), (1, 2), (2, 3), (3, 0), (3, 4), (4, 5), (5, 3)]);
        let CycleSearch::Found(cycle) = find_cycle_through(&graph, 1) else {
            panic!("square must be found");
        };
        assert!(cycle.nodes().contains(&1));
        assert_eq!(cycle.edge_count(), 4);
        assert!(cycle.edges().all(|(u, v)| graph.has_edge(u, v)));
    }

    #[test]
    fn shared_edges_report_already_broken() {
        // Two triangles sharing edge 1-2.
        let mut graph = graph_from(4, &[(0, 1), (1, 2), (2, 0), (1, 3), (3, 2)]);
        let report = CycleRepairer::new(3).remove_short_cycles(&mut graph);
        assert_eq!(report.cycles_found, 2);
        assert_eq!(report.short_cycles(), 2);
        assert_eq!(report.broken() + report.already_broken(), 2);
        assert!(report.broken() >= 1);
        assert!(graph.is_connected());
        assert_eq!(graph.edge_count(), 5 - report.broken());
    }

    #[test]
    fn long_cycles_are_left_alone() {
        let mut graph = graph_from(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        let report = CycleRepairer::new(3).remove_short_cycles(&mut graph);
        assert_eq!(report.cycles_found, 1);
        assert_eq!(report.short_cycles(), 0);
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn disconnected_graph_keeps_its_cycles() {
        let mut graph = graph_from(5, &[(0, 1), (1, 2), (2, 0), (3, 4)]);
        let report = CycleRepairer::new(3).remove_short_cycles(&mut graph);
        assert_eq!(report.outcomes, vec![CycleOutcome::Kept]);
        assert_eq!(report.acyclic_nodes, 2);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn removed_edges_are_listed() {
        let mut graph = graph_from(3, &[(0, 1), (1, 2), (2, 0)]);
        let report = CycleRepairer::new(3).remove_short_cycles(&mut graph);
        let removed: Vec<_> = report.removed_edges().collect();
        assert_eq!(removed, vec![(0, 1)]);
        assert!(!graph.has_edge(0, 1));
    }
}
