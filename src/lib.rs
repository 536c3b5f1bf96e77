//! Guild network scorer
//!
//! Scores the ecological compatibility of a plant guild with seven metrics
//! and explains the result through the guild's shared organism networks.
//!
//! - `guild`: typed plant records (missing vs empty organism lists kept apart)
//! - `data`: Polars loaders for guild tables and curated lookups
//! - `utils`: normalization, organism matching/counting, Newick trees
//! - `metrics`: M1-M7
//! - `explanation`: network analyzers and guild-level warnings
//! - `scorer`: parallel orchestration and the overall score

pub mod config;
pub mod data;
pub mod error;
pub mod explanation;
pub mod guild;
pub mod lookups;
pub mod metrics;
pub mod scorer;
pub mod utils;

// Re-export commonly used types
pub use config::{DataPaths, ScoringConfig, TierWeights};
pub use data::GuildData;
pub use error::{ConfigError, GuildError, MetricError, NormalizationError};
pub use explanation::{guild_warnings, NetworkAnalysis, NetworkProfiles, Severity, WarningCard, WarningKind};
pub use guild::{GrowthForm, Guild, Interaction, PlantRecord};
pub use lookups::LookupTables;
pub use metrics::{MetricDetail, MetricId, MetricResult, MetricScore, MetricTier, UncalibratedReason};
pub use scorer::{build_network_profiles, score_guild, GuildScoreResult, GuildScorer, OverallScore};
pub use utils::{Calibration, CsrCalibration, PercentileParams};
