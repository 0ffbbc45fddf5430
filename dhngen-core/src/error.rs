//! Error types for the dhngen core library.
//!
//! Every public error enum carries a stable machine-readable code so the CLI
//! and downstream collaborators can log or match on failures without parsing
//! display strings.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// A generator parameter failed validation.
///
/// These are configuration errors: construction cannot succeed with the
/// supplied values, so they are surfaced immediately and never retried.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParamsError {
    /// A probability fell outside `[0, 1]` or was not finite.
    #[error("probability `{name}` must lie in [0, 1] (got {value})")]
    InvalidProbability {
        /// Name of the offending parameter.
        name: &'static str,
        /// Value supplied by the caller.
        value: f64,
    },
    /// Regions need at least two nodes for the edge/node ratio to exist.
    #[error("nodes_per_region must be at least 2 (got {got})")]
    RegionTooSmall {
        /// The rejected region size.
        got: usize,
    },
    /// At least one region is required.
    #[error("region_count must be at least 1")]
    NoRegions,
    /// The out-degree draw `[1, max_degree)` needs a non-empty range.
    #[error("max_degree must be at least 2 (got {got})")]
    DegreeTooSmall {
        /// The rejected degree cap.
        got: usize,
    },
    /// The region cursor must advance.
    #[error("jump_step must be at least 1")]
    ZeroJumpStep,
    /// A real-valued parameter was non-finite or out of range.
    #[error("parameter `{name}` is invalid: {reason}")]
    InvalidValue {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable constraint that was violated.
        reason: &'static str,
    },
    /// A sampling range was empty, non-finite or not strictly positive.
    #[error("range `{name}` must satisfy 0 < min <= max (got [{min}, {max}])")]
    InvalidRange {
        /// Name of the offending range.
        name: &'static str,
        /// Lower bound supplied by the caller.
        min: f64,
        /// Upper bound supplied by the caller.
        max: f64,
    },
    /// A retry budget was zero, which would make the stage a no-op.
    #[error("retry budget `{name}` must be at least 1")]
    ZeroBudget {
        /// Name of the offending budget.
        name: &'static str,
    },
    /// No anchor coordinates were configured.
    #[error("at least one region anchor is required")]
    NoAnchors,
}

define_error_codes! {
    /// Stable codes describing [`ParamsError`] variants.
    enum ParamsErrorCode for ParamsError {
        /// A probability fell outside `[0, 1]`.
        InvalidProbability => InvalidProbability { .. } => "PARAMS_INVALID_PROBABILITY",
        /// Regions were too small.
        RegionTooSmall => RegionTooSmall { .. } => "PARAMS_REGION_TOO_SMALL",
        /// No regions were requested.
        NoRegions => NoRegions => "PARAMS_NO_REGIONS",
        /// The degree cap was too small.
        DegreeTooSmall => DegreeTooSmall { .. } => "PARAMS_DEGREE_TOO_SMALL",
        /// The region cursor step was zero.
        ZeroJumpStep => ZeroJumpStep => "PARAMS_ZERO_JUMP_STEP",
        /// A real-valued parameter was invalid.
        InvalidValue => InvalidValue { .. } => "PARAMS_INVALID_VALUE",
        /// A sampling range was invalid.
        InvalidRange => InvalidRange { .. } => "PARAMS_INVALID_RANGE",
        /// A retry budget was zero.
        ZeroBudget => ZeroBudget { .. } => "PARAMS_ZERO_BUDGET",
        /// No anchors were configured.
        NoAnchors => NoAnchors => "PARAMS_NO_ANCHORS",
    }
}

/// Connectivity repair could not join every component.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConnectivityError {
    /// Every node below the degree cap is already adjacent to every other one.
    #[error("no connectable node pair remains ({components} components left)")]
    NoConnectablePair {
        /// Components remaining when repair gave up.
        components: usize,
    },
    /// The random trial budget ran out before the graph became connected.
    #[error("graph still has {components} components after {trials} trials")]
    TrialsExhausted {
        /// Random draws performed.
        trials: usize,
        /// Components remaining when repair gave up.
        components: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConnectivityError`] variants.
    enum ConnectivityErrorCode for ConnectivityError {
        /// No connectable pair remained.
        NoConnectablePair => NoConnectablePair { .. } => "CONNECTIVITY_NO_CONNECTABLE_PAIR",
        /// The trial budget ran out.
        TrialsExhausted => TrialsExhausted { .. } => "CONNECTIVITY_TRIALS_EXHAUSTED",
    }
}

/// A [`crate::LayoutProvider`] returned an unusable embedding.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LayoutError {
    /// The provider returned a different number of positions than nodes.
    #[error("layout returned {got} positions for {expected} nodes")]
    PositionCountMismatch {
        /// Node count of the graph.
        expected: usize,
        /// Positions returned.
        got: usize,
    },
    /// A coordinate was NaN or infinite.
    #[error("layout produced a non-finite position for node {node}")]
    NonFinitePosition {
        /// Node whose position was rejected.
        node: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`LayoutError`] variants.
    enum LayoutErrorCode for LayoutError {
        /// Wrong number of positions.
        PositionCountMismatch => PositionCountMismatch { .. } => "LAYOUT_POSITION_COUNT_MISMATCH",
        /// Non-finite coordinate.
        NonFinitePosition => NonFinitePosition { .. } => "LAYOUT_NON_FINITE_POSITION",
    }
}

/// Error type produced when assembling a topology.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationError {
    /// The parameter set was rejected before construction began.
    #[error("invalid generator parameters: {source}")]
    InvalidParams {
        /// Validation failure.
        #[from]
        source: ParamsError,
    },
    /// No attempt produced a connected region graph.
    #[error("region {region} could not be connected in {attempts} attempts: {source}")]
    RegionUnconnectable {
        /// Zero-based index of the region being built.
        region: usize,
        /// Attempts spent on the region.
        attempts: usize,
        /// Failure reported by the final attempt.
        #[source]
        source: ConnectivityError,
    },
    /// Inter-region densification left the network disconnected.
    #[error("network still has {components} components after {passes} densification passes")]
    Disconnected {
        /// Components remaining.
        components: usize,
        /// Passes performed.
        passes: usize,
    },
    /// Every assembly attempt failed with a recoverable error.
    #[error("no connected network after {attempts} assembly attempts")]
    RetriesExhausted {
        /// Assembly attempts performed.
        attempts: usize,
    },
    /// The layout provider failed.
    #[error("layout provider `{provider}` failed: {source}")]
    Layout {
        /// Name reported by the provider.
        provider: Arc<str>,
        /// Underlying layout failure.
        #[source]
        source: LayoutError,
    },
}

define_error_codes! {
    /// Stable codes describing [`GenerationError`] variants.
    enum GenerationErrorCode for GenerationError {
        /// The parameters were rejected.
        InvalidParams => InvalidParams { .. } => "GENERATION_INVALID_PARAMS",
        /// A region could not be connected.
        RegionUnconnectable => RegionUnconnectable { .. } => "GENERATION_REGION_UNCONNECTABLE",
        /// Densification left the network disconnected.
        Disconnected => Disconnected { .. } => "GENERATION_DISCONNECTED",
        /// Assembly retries ran out.
        RetriesExhausted => RetriesExhausted { .. } => "GENERATION_RETRIES_EXHAUSTED",
        /// The layout provider failed.
        LayoutFailure => Layout { .. } => "GENERATION_LAYOUT_FAILURE",
    }
}

impl GenerationError {
    /// Whether a fresh assembly attempt may succeed where this one failed.
    ///
    /// Only structural non-convergence is recoverable; configuration and
    /// layout failures repeat deterministically.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. } | Self::RegionUnconnectable { .. }
        )
    }

    /// Retrieve the inner [`ParamsErrorCode`] when the parameters were rejected.
    #[must_use]
    pub const fn params_code(&self) -> Option<ParamsErrorCode> {
        match self {
            Self::InvalidParams { source } => Some(source.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, GenerationError>;
