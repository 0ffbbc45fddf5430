//! Generator parameters and their validating builder.
//!
//! [`GeneratorParamsBuilder`] collects the tunables with the defaults of the
//! reference generator and [`GeneratorParamsBuilder::build`] checks them once,
//! producing an immutable [`GeneratorParams`] shared by every stage.

use crate::{
    error::ParamsError,
    geometry::Position,
    weights::{EdgeWeights, PropertyRange},
};

/// Anchor coordinates cycled through when placing regions.
pub const DEFAULT_ANCHORS: [Position; 5] = [
    Position::new(-1.0, -1.0),
    Position::new(1.0, 1.0),
    Position::new(-1.0, 1.0),
    Position::new(2.0, 1.0),
    Position::new(1.0, 2.0),
];

/// Decides when producer backfill stops.
///
/// `Inclusive` keeps adding while the count is `<=` the target and therefore
/// ends one producer above it; `Exclusive` stops exactly at the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackfillBoundary {
    /// Stop once the producer count reaches the target.
    #[default]
    Exclusive,
    /// Stop once the producer count exceeds the target.
    Inclusive,
}

impl BackfillBoundary {
    /// Whether backfill should add another producer given the current count.
    #[must_use]
    pub const fn wants_more(self, current: usize, target: usize) -> bool {
        match self {
            Self::Exclusive => current < target,
            Self::Inclusive => current <= target,
        }
    }
}

/// Explicit bounds for every retry loop in the generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryBudget {
    /// Region rebuilds allowed while chasing the target ratio.
    pub region_attempts: usize,
    /// Accepted distance between a region's ratio and the target.
    pub ratio_tolerance: f64,
    /// Random pair draws allowed per connectivity repair.
    pub connect_trials: usize,
    /// Inter-region densification passes before declaring failure.
    pub densify_passes: usize,
    /// Full assembly attempts performed by [`crate::TopologyAssembler::generate`].
    pub assembly_attempts: usize,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            region_attempts: 100,
            ratio_tolerance: 0.1,
            connect_trials: 10_000,
            densify_passes: 10,
            assembly_attempts: 32,
        }
    }
}

/// Validated, immutable generator configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorParams {
    central_producer_probability: f64,
    region_producer_probability: f64,
    inter_region_pipe_probability: f64,
    nodes_per_region: usize,
    region_count: usize,
    max_diameter: usize,
    min_cycle_length: usize,
    target_ratio: f64,
    min_producer_distance: usize,
    producer_target: usize,
    max_degree: usize,
    jump_step: usize,
    edge_weights: EdgeWeights,
    pipe_diameter: PropertyRange,
    convective_coefficient: PropertyRange,
    anchors: Vec<Position>,
    backfill: BackfillBoundary,
    retry: RetryBudget,
}

impl GeneratorParams {
    /// Probability that node 0 becomes a central producer.
    #[must_use]
    #[rustfmt::skip]
    pub fn central_producer_probability(&self) -> f64 { self.central_producer_probability }

    /// Probability that a region receives its own producer.
    #[must_use]
    #[rustfmt::skip]
    pub fn region_producer_probability(&self) -> f64 { self.region_producer_probability }

    /// Probability of an inter-region pipe per region pair per pass.
    #[must_use]
    #[rustfmt::skip]
    pub fn inter_region_pipe_probability(&self) -> f64 { self.inter_region_pipe_probability }

    /// Nodes generated per region.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes_per_region(&self) -> usize { self.nodes_per_region }

    /// Number of regions.
    #[must_use]
    #[rustfmt::skip]
    pub fn region_count(&self) -> usize { self.region_count }

    /// Advisory hop-diameter; exceeding it is logged, never enforced.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_diameter(&self) -> usize { self.max_diameter }

    /// Cycles with at most this many edges are removal candidates.
    #[must_use]
    #[rustfmt::skip]
    pub fn min_cycle_length(&self) -> usize { self.min_cycle_length }

    /// Desired `edges / (nodes - 1)` per region.
    #[must_use]
    #[rustfmt::skip]
    pub fn target_ratio(&self) -> f64 { self.target_ratio }

    /// Minimum hop distance kept between producers.
    #[must_use]
    #[rustfmt::skip]
    pub fn min_producer_distance(&self) -> usize { self.min_producer_distance }

    /// Producer count targeted by backfill.
    #[must_use]
    #[rustfmt::skip]
    pub fn producer_target(&self) -> usize { self.producer_target }

    /// Degree cap used while building regions.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_degree(&self) -> usize { self.max_degree }

    /// Cursor step of the region construction loop.
    #[must_use]
    #[rustfmt::skip]
    pub fn jump_step(&self) -> usize { self.jump_step }

    /// Pipe weight distribution.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_weights(&self) -> EdgeWeights { self.edge_weights }

    /// Range pipe diameters are drawn from, in metres.
    #[must_use]
    #[rustfmt::skip]
    pub fn pipe_diameter(&self) -> PropertyRange { self.pipe_diameter }

    /// Range pipe convective coefficients are drawn from.
    #[must_use]
    #[rustfmt::skip]
    pub fn convective_coefficient(&self) -> PropertyRange { self.convective_coefficient }

    /// Region anchors, cycled when there are more regions than anchors.
    #[must_use]
    #[rustfmt::skip]
    pub fn anchors(&self) -> &[Position] { &self.anchors }

    /// Anchor used by the region with zero-based index `region`.
    #[must_use]
    pub fn anchor_for(&self, region: usize) -> Position {
        // `anchors` is non-empty after validation.
        self.anchors
            .get(region % self.anchors.len().max(1))
            .copied()
            .unwrap_or(Position::ORIGIN)
    }

    /// Backfill stopping rule.
    #[must_use]
    #[rustfmt::skip]
    pub fn backfill(&self) -> BackfillBoundary { self.backfill }

    /// Retry bounds.
    #[must_use]
    #[rustfmt::skip]
    pub fn retry(&self) -> RetryBudget { self.retry }
}

impl Default for GeneratorParams {
    fn default() -> Self {
        let builder = GeneratorParamsBuilder::default();
        Self {
            central_producer_probability: builder.central_producer_probability,
            region_producer_probability: builder.region_producer_probability,
            inter_region_pipe_probability: builder.inter_region_pipe_probability,
            nodes_per_region: builder.nodes_per_region,
            region_count: builder.region_count,
            max_diameter: builder.max_diameter,
            min_cycle_length: builder.min_cycle_length,
            target_ratio: builder.target_ratio,
            min_producer_distance: builder.min_producer_distance,
            producer_target: builder.producer_target,
            max_degree: builder.max_degree,
            jump_step: builder.jump_step,
            edge_weights: EdgeWeights::new(builder.edge_weight_mean, builder.edge_weight_std),
            pipe_diameter: builder.pipe_diameter,
            convective_coefficient: builder.convective_coefficient,
            anchors: builder.anchors,
            backfill: builder.backfill,
            retry: builder.retry,
        }
    }
}

/// Configures and validates [`GeneratorParams`].
///
/// # Examples
/// ```
/// use dhngen_core::GeneratorParamsBuilder;
///
/// let params = GeneratorParamsBuilder::new()
///     .with_region_count(3)
///     .with_nodes_per_region(20)
///     .with_central_producer_probability(1.0)
///     .build()
///     .expect("parameters are valid");
/// assert_eq!(params.region_count(), 3);
/// assert_eq!(params.nodes_per_region(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct GeneratorParamsBuilder {
    central_producer_probability: f64,
    region_producer_probability: f64,
    inter_region_pipe_probability: f64,
    nodes_per_region: usize,
    region_count: usize,
    max_diameter: usize,
    min_cycle_length: usize,
    target_ratio: f64,
    min_producer_distance: usize,
    producer_target: usize,
    max_degree: usize,
    jump_step: usize,
    edge_weight_mean: f64,
    edge_weight_std: f64,
    pipe_diameter: PropertyRange,
    convective_coefficient: PropertyRange,
    anchors: Vec<Position>,
    backfill: BackfillBoundary,
    retry: RetryBudget,
}

impl Default for GeneratorParamsBuilder {
    fn default() -> Self {
        Self {
            central_producer_probability: 0.5,
            region_producer_probability: 0.2,
            inter_region_pipe_probability: 0.1,
            nodes_per_region: 100,
            region_count: 4,
            max_diameter: 12,
            min_cycle_length: 3,
            target_ratio: 1.01,
            min_producer_distance: 3,
            producer_target: 3,
            max_degree: 3,
            jump_step: 1,
            edge_weight_mean: 1.5,
            edge_weight_std: 0.2,
            pipe_diameter: PropertyRange::new(0.05, 0.5),
            convective_coefficient: PropertyRange::new(0.8, 4.0),
            anchors: DEFAULT_ANCHORS.to_vec(),
            backfill: BackfillBoundary::default(),
            retry: RetryBudget::default(),
        }
    }
}

macro_rules! builder_setters {
    ($( $(#[$meta:meta])* $setter:ident => $field:ident : $ty:ty ),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $setter(mut self, value: $ty) -> Self {
                self.$field = value;
                self
            }
        )+
    };
}

impl GeneratorParamsBuilder {
    /// Creates a builder populated with the reference defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    builder_setters! {
        /// Probability of a central producer at node 0.
        with_central_producer_probability => central_producer_probability: f64,
        /// Probability that a region gets a dedicated producer.
        with_region_producer_probability => region_producer_probability: f64,
        /// Probability of an inter-region pipe per region pair per pass.
        with_inter_region_pipe_probability => inter_region_pipe_probability: f64,
        /// Nodes per region.
        with_nodes_per_region => nodes_per_region: usize,
        /// Number of regions.
        with_region_count => region_count: usize,
        /// Advisory hop-diameter.
        with_max_diameter => max_diameter: usize,
        /// Cycles at or below this edge count are removal candidates.
        with_min_cycle_length => min_cycle_length: usize,
        /// Target `edges / (nodes - 1)` per region.
        with_target_ratio => target_ratio: f64,
        /// Minimum hop distance between retained producers.
        with_min_producer_distance => min_producer_distance: usize,
        /// Producer count targeted by backfill.
        with_producer_target => producer_target: usize,
        /// Degree cap for region construction.
        with_max_degree => max_degree: usize,
        /// Cursor step of the region construction loop.
        with_jump_step => jump_step: usize,
        /// Mean pipe weight.
        with_edge_weight_mean => edge_weight_mean: f64,
        /// Standard deviation of pipe weights.
        with_edge_weight_std => edge_weight_std: f64,
        /// Range pipe diameters are drawn from.
        with_pipe_diameter => pipe_diameter: PropertyRange,
        /// Range pipe convective coefficients are drawn from.
        with_convective_coefficient => convective_coefficient: PropertyRange,
        /// Region anchors.
        with_anchors => anchors: Vec<Position>,
        /// Backfill stopping rule.
        with_backfill => backfill: BackfillBoundary,
        /// Retry bounds.
        with_retry_budget => retry: RetryBudget,
    }

    /// Overrides the number of full assembly attempts.
    #[must_use]
    pub fn with_assembly_attempts(mut self, attempts: usize) -> Self {
        self.retry.assembly_attempts = attempts;
        self
    }

    /// Returns the configured region count.
    #[must_use]
    #[rustfmt::skip]
    pub fn region_count(&self) -> usize { self.region_count }

    /// Returns the configured region size.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes_per_region(&self) -> usize { self.nodes_per_region }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`ParamsError`] for probabilities outside `[0, 1]`, regions
    /// smaller than two nodes, zero regions, a degree cap below two, a zero
    /// cursor step, non-positive weight or ratio parameters, malformed pipe
    /// property ranges, zero retry budgets, or an empty anchor list.
    ///
    /// # Examples
    /// ```
    /// use dhngen_core::{GeneratorParamsBuilder, ParamsError};
    ///
    /// let err = GeneratorParamsBuilder::new()
    ///     .with_max_degree(1)
    ///     .build()
    ///     .expect_err("degree cap of one cannot build regions");
    /// assert_eq!(err, ParamsError::DegreeTooSmall { got: 1 });
    /// ```
    pub fn build(self) -> Result<GeneratorParams, ParamsError> {
        check_probability("central_producer_probability", self.central_producer_probability)?;
        check_probability("region_producer_probability", self.region_producer_probability)?;
        check_probability(
            "inter_region_pipe_probability",
            self.inter_region_pipe_probability,
        )?;
        if self.nodes_per_region < 2 {
            return Err(ParamsError::RegionTooSmall {
                got: self.nodes_per_region,
            });
        }
        if self.region_count == 0 {
            return Err(ParamsError::NoRegions);
        }
        if self.max_degree < 2 {
            return Err(ParamsError::DegreeTooSmall {
                got: self.max_degree,
            });
        }
        if self.jump_step == 0 {
            return Err(ParamsError::ZeroJumpStep);
        }
        check_positive("target_ratio", self.target_ratio)?;
        check_positive("edge_weight_mean", self.edge_weight_mean)?;
        if !self.edge_weight_std.is_finite() || self.edge_weight_std < 0.0 {
            return Err(ParamsError::InvalidValue {
                name: "edge_weight_std",
                reason: "must be finite and non-negative",
            });
        }
        check_range("pipe_diameter", self.pipe_diameter)?;
        check_range("convective_coefficient", self.convective_coefficient)?;
        if !self.retry.ratio_tolerance.is_finite() || self.retry.ratio_tolerance < 0.0 {
            return Err(ParamsError::InvalidValue {
                name: "ratio_tolerance",
                reason: "must be finite and non-negative",
            });
        }
        check_budget("region_attempts", self.retry.region_attempts)?;
        check_budget("connect_trials", self.retry.connect_trials)?;
        check_budget("densify_passes", self.retry.densify_passes)?;
        check_budget("assembly_attempts", self.retry.assembly_attempts)?;
        if self.anchors.is_empty() {
            return Err(ParamsError::NoAnchors);
        }
        if self.anchors.iter().any(|anchor| !anchor.is_finite()) {
            return Err(ParamsError::InvalidValue {
                name: "anchors",
                reason: "coordinates must be finite",
            });
        }

        Ok(GeneratorParams {
            central_producer_probability: self.central_producer_probability,
            region_producer_probability: self.region_producer_probability,
            inter_region_pipe_probability: self.inter_region_pipe_probability,
            nodes_per_region: self.nodes_per_region,
            region_count: self.region_count,
            max_diameter: self.max_diameter,
            min_cycle_length: self.min_cycle_length,
            target_ratio: self.target_ratio,
            min_producer_distance: self.min_producer_distance,
            producer_target: self.producer_target,
            max_degree: self.max_degree,
            jump_step: self.jump_step,
            edge_weights: EdgeWeights::new(self.edge_weight_mean, self.edge_weight_std),
            pipe_diameter: self.pipe_diameter,
            convective_coefficient: self.convective_coefficient,
            anchors: self.anchors,
            backfill: self.backfill,
            retry: self.retry,
        })
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ParamsError::InvalidProbability { name, value })
    }
}

fn check_range(name: &'static str, range: PropertyRange) -> Result<(), ParamsError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ParamsError::InvalidRange {
            name,
            min: range.min(),
            max: range.max(),
        })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::InvalidValue {
            name,
            reason: "must be finite and positive",
        })
    }
}

fn check_budget(name: &'static str, value: usize) -> Result<(), ParamsError> {
    if value == 0 {
        Err(ParamsError::ZeroBudget { name })
    } else {
        Ok(())
    }
}
