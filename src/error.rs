//! Error types for guild scoring.
//!
//! `GuildError` is fatal for a scoring call. `MetricError` is isolated to a
//! single metric slot and never aborts the other six.

use serde::Serialize;

use crate::metrics::MetricId;

/// Fatal errors for a whole guild-scoring call.
#[derive(Debug, thiserror::Error)]
pub enum GuildError {
    #[error("guild must contain at least one plant")]
    EmptyGuild,

    #[error("plant {id} appears more than once in the guild")]
    DuplicatePlant { id: String },

    #[error("plant {id} not found in plant table")]
    MissingPlant { id: String },

    #[error("malformed record for plant {plant}: {reason}")]
    MalformedPlant { plant: String, reason: String },

    #[error("column {column} has unreadable type {dtype}")]
    MalformedColumn { column: String, dtype: String },
}

/// Failure of a single metric. Reported in that metric's slot only.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum MetricError {
    #[error("plant {plant} has no {trait_name} data")]
    MissingTrait { plant: String, trait_name: String },

    #[error("metric {metric:?} panicked: {message}")]
    Panicked { metric: MetricId, message: String },
}

/// Reference-distribution lookup failures.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum NormalizationError {
    #[error("no calibration for climate tier {tier}")]
    UnknownTier { tier: String },

    #[error("tier {tier} has no calibration for {metric:?}")]
    MissingMetric { metric: MetricId, tier: String },

    #[error("breakpoints for {metric} in tier {tier} are not non-decreasing")]
    NonMonotonic { metric: String, tier: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("tier weights must be non-negative with a positive sum (universal={universal}, bonus={bonus})")]
    InvalidWeights { universal: f64, bonus: f64 },

    #[error("top_n must be at least 1")]
    InvalidTopN,
}
