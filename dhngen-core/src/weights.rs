//! Pipe property sampling.
//!
//! Weights follow `N(mean, std)`. Non-positive draws are redrawn a bounded
//! number of times and then replaced by `mean / 2`. Diameters and convective
//! coefficients are uniform over a closed [`PropertyRange`].

use rand::Rng;
use rand_distr::{Distribution, Normal};

const MAX_REDRAWS: usize = 16;

/// Normal distribution used to draw positive pipe weights.
///
/// # Examples
/// ```
/// use dhngen_core::EdgeWeights;
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let weights = EdgeWeights::new(1.5, 0.2);
/// let mut rng = SmallRng::seed_from_u64(7);
/// assert!((0..100).all(|_| weights.sample(&mut rng) > 0.0));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EdgeWeights {
    mean: f64,
    std: f64,
    normal: Option<Normal<f64>>,
}

impl EdgeWeights {
    /// Creates a sampler; validation happens in [`crate::GeneratorParamsBuilder`].
    ///
    /// A spread that `Normal` rejects leaves the sampler returning the
    /// fallback weight `mean / 2`.
    #[must_use]
    pub fn new(mean: f64, std: f64) -> Self {
        Self {
            mean,
            std,
            normal: Normal::new(mean, std).ok(),
        }
    }

    /// Mean of the distribution.
    #[must_use]
    #[rustfmt::skip]
    pub fn mean(&self) -> f64 { self.mean }

    /// Standard deviation of the distribution.
    #[must_use]
    #[rustfmt::skip]
    pub fn std(&self) -> f64 { self.std }

    /// Draws one strictly positive weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if let Some(normal) = &self.normal {
            for _ in 0..MAX_REDRAWS {
                let weight = normal.sample(rng);
                if weight > 0.0 && weight.is_finite() {
                    return weight;
                }
            }
        }
        self.mean / 2.0
    }
}

impl PartialEq for EdgeWeights {
    fn eq(&self, other: &Self) -> bool {
        self.mean == other.mean && self.std == other.std
    }
}

/// Closed interval a per-pipe property is drawn from uniformly.
///
/// # Examples
/// ```
/// use dhngen_core::PropertyRange;
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let diameters = PropertyRange::new(0.05, 0.5);
/// let mut rng = SmallRng::seed_from_u64(3);
/// let drawn = diameters.sample(&mut rng);
/// assert!(diameters.contains(drawn));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyRange {
    min: f64,
    max: f64,
}

impl PropertyRange {
    /// Creates a range; validation happens in [`crate::GeneratorParamsBuilder`].
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Lower bound.
    #[must_use]
    #[rustfmt::skip]
    pub fn min(&self) -> f64 { self.min }

    /// Upper bound.
    #[must_use]
    #[rustfmt::skip]
    pub fn max(&self) -> f64 { self.max }

    /// Whether `value` lies inside the interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Whether the bounds are finite, strictly positive and ordered.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min <= self.max
    }

    /// Draws one value uniformly; an invalid range yields its lower bound.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.is_valid() {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1)]
    #[case(42)]
    #[case(9001)]
    fn sample_mean_tracks_distribution(#[case] seed: u64) {
        let weights = EdgeWeights::new(1.5, 0.2);
        let mut rng = SmallRng::seed_from_u64(seed);
        let draws: Vec<f64> = (0..4000).map(|_| weights.sample(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / 4000.0;
        assert!((mean - 1.5).abs() < 0.05, "mean {mean} drifted");
        assert!(draws.iter().all(|&w| w > 0.0));
    }

    #[test]
    fn falls_back_to_half_mean_when_every_draw_is_negative() {
        let weights = EdgeWeights::new(-1.0, 0.0);
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(weights.sample(&mut rng), -0.5);
    }

    #[test]
    fn rejected_spread_yields_the_fallback_weight() {
        let weights = EdgeWeights::new(2.0, -1.0);
        let mut rng = SmallRng::seed_from_u64(12);
        assert_eq!(weights.sample(&mut rng), 1.0);
    }

    #[rstest]
    #[case(0.05, 0.5)]
    #[case(0.8, 4.0)]
    #[case(1.0, 1.0)]
    fn property_draws_stay_inside_the_range(#[case] min: f64, #[case] max: f64) {
        let range = PropertyRange::new(min, max);
        let mut rng = SmallRng::seed_from_u64(21);
        assert!((0..500).all(|_| range.contains(range.sample(&mut rng))));
    }

    #[rstest]
    #[case(0.5, 0.05)]
    #[case(0.0, 1.0)]
    #[case(f64::NAN, 1.0)]
    #[case(1.0, f64::INFINITY)]
    fn rejects_malformed_ranges(#[case] min: f64, #[case] max: f64) {
        assert!(!PropertyRange::new(min, max).is_valid());
    }

    #[test]
    fn zero_spread_returns_mean() {
        let weights = EdgeWeights::new(2.0, 0.0);
        let mut rng = SmallRng::seed_from_u64(11);
        assert_eq!(weights.sample(&mut rng), 2.0);
    }
}
