//! Planar embedding of the assembled network.

use crate::{error::LayoutError, geometry::Position, graph::Graph};

/// Computes a 2D position for every node of a graph.
///
/// Implementations receive one seed position per node (regions are seeded
/// around their anchors) and must return exactly one finite position per
/// node. The assembler validates both conditions through [`validate_layout`].
///
/// # Examples
/// ```
/// use dhngen_core::{Graph, LayoutError, LayoutProvider, Position};
///
/// struct Identity;
///
/// impl LayoutProvider for Identity {
///     fn name(&self) -> &str { "identity" }
///     fn layout(&self, _graph: &Graph, seeds: &[Position]) -> Result<Vec<Position>, LayoutError> {
///         Ok(seeds.to_vec())
///     }
/// }
///
/// let graph = Graph::with_nodes(2);
/// let seeds = [Position::new(0.0, 0.0), Position::new(1.0, 0.0)];
/// assert_eq!(Identity.layout(&graph, &seeds)?, seeds);
/// # Ok::<(), LayoutError>(())
/// ```
pub trait LayoutProvider {
    /// Human-readable provider name, recorded on layout failures.
    fn name(&self) -> &str;

    /// Embeds `graph` starting from `seeds`.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] when the embedding cannot be produced.
    fn layout(&self, graph: &Graph, seeds: &[Position]) -> Result<Vec<Position>, LayoutError>;
}

/// Checks that `positions` holds one finite coordinate per node of `graph`.
///
/// # Errors
/// Returns [`LayoutError::PositionCountMismatch`] or
/// [`LayoutError::NonFinitePosition`].
pub fn validate_layout(graph: &Graph, positions: &[Position]) -> Result<(), LayoutError> {
    if positions.len() != graph.node_count() {
        return Err(LayoutError::PositionCountMismatch {
            expected: graph.node_count(),
            got: positions.len(),
        });
    }
    match positions.iter().position(|position| !position.is_finite()) {
        Some(node) => Err(LayoutError::NonFinitePosition { node }),
        None => Ok(()),
    }
}

const MIN_DISTANCE: f64 = 1e-6;

/// Deterministic Fruchterman–Reingold spring embedder.
///
/// Every pair of nodes repels with force `k² / d` and every edge attracts with
/// `d² / k`, where `k` is the ideal edge length derived from the seed spread.
/// Per-iteration displacement is capped by a temperature that cools linearly
/// to zero. The final layout is centred on the origin and scaled so the
/// furthest node sits `scale` away from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceDirectedLayout {
    iterations: usize,
    scale: f64,
}

impl Default for ForceDirectedLayout {
    fn default() -> Self {
        Self {
            iterations: 200,
            scale: 10.0,
        }
    }
}

impl ForceDirectedLayout {
    /// Creates a layout with 200 iterations and a scale of 10.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of simulation steps.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the radius of the final layout.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Configured number of simulation steps.
    #[must_use]
    #[rustfmt::skip]
    pub fn iterations(&self) -> usize { self.iterations }

    /// Configured radius of the final layout.
    #[must_use]
    #[rustfmt::skip]
    pub fn scale(&self) -> f64 { self.scale }

    fn simulate(&self, graph: &Graph, positions: &mut [Position]) {
        let n = positions.len();
        if n == 0 {
            return;
        }
        let (min, max) = bounds(positions);
        let side = (max.x - min.x).max(max.y - min.y).max(1.0);
        let k = side / (n as f64).sqrt();
        let initial_temperature = side / 10.0;
        let mut displacement = vec![Position::ORIGIN; n];

        for step in 0..self.iterations {
            displacement.fill(Position::ORIGIN);

            for i in 0..n {
                for j in (i + 1)..n {
                    let (direction, distance) = separation(positions[i], positions[j], i, j);
                    let push = direction * (k * k / distance);
                    displacement[i] = displacement[i] + push;
                    displacement[j] = displacement[j] - push;
                }
            }

            for edge in graph.edges() {
                let (u, v) = (edge.source, edge.target);
                let (direction, distance) = separation(positions[u], positions[v], u, v);
                let pull = direction * (distance * distance / k);
                displacement[u] = displacement[u] - pull;
                displacement[v] = displacement[v] + pull;
            }

            let temperature =
                initial_temperature * (1.0 - step as f64 / self.iterations as f64);
            for (position, delta) in positions.iter_mut().zip(&displacement) {
                let length = delta.norm();
                if length > MIN_DISTANCE {
                    *position = *position + *delta * (length.min(temperature) / length);
                }
            }
        }
    }

    fn rescale(&self, positions: &mut [Position]) {
        if positions.is_empty() {
            return;
        }
        let count = positions.len() as f64;
        let centroid = positions
            .iter()
            .fold(Position::ORIGIN, |sum, &position| sum + position)
            * (1.0 / count);
        let radius = positions
            .iter()
            .map(|&position| (position - centroid).norm())
            .fold(0.0_f64, f64::max);
        let factor = if radius > MIN_DISTANCE {
            self.scale / radius
        } else {
            0.0
        };
        for position in positions {
            *position = (*position - centroid) * factor;
        }
    }
}

impl LayoutProvider for ForceDirectedLayout {
    fn name(&self) -> &str {
        "force-directed"
    }

    fn layout(&self, graph: &Graph, seeds: &[Position]) -> Result<Vec<Position>, LayoutError> {
        validate_layout(graph, seeds)?;
        let mut positions = seeds.to_vec();
        self.simulate(graph, &mut positions);
        self.rescale(&mut positions);
        validate_layout(graph, &positions)?;
        Ok(positions)
    }
}

fn bounds(positions: &[Position]) -> (Position, Position) {
    positions.iter().fold(
        (
            Position::new(f64::INFINITY, f64::INFINITY),
            Position::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Position::new(min.x.min(p.x), min.y.min(p.y)),
                Position::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    )
}

/// Unit vector from `b` to `a` and their distance.
///
/// Coincident nodes are pushed apart along a direction derived from their
/// ids so the simulation stays deterministic.
fn separation(a: Position, b: Position, i: usize, j: usize) -> (Position, f64) {
    let delta = a - b;
    let distance = delta.norm();
    if distance > MIN_DISTANCE {
        return (delta * (1.0 / distance), distance);
    }
    let angle = (i * 31 + j * 17) as f64;
    (Position::new(angle.cos(), angle.sin()), MIN_DISTANCE)
}
