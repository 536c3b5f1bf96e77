//! Metric modules for guild scoring
//!
//! Each metric is a pure function of `(Guild, LookupTables)` returning a
//! `MetricResult` or a per-metric `MetricError`.

pub mod m1_pest_pathogen_indep;
pub mod m2_growth_compatibility;
pub mod m3_insect_control;
pub mod m4_disease_control;
pub mod m5_beneficial_fungi;
pub mod m6_structural_diversity;
pub mod m7_pollinator_support;

pub use m1_pest_pathogen_indep::{calculate_m1, M1Detail, PhyloPDCalculator};
pub use m2_growth_compatibility::{calculate_m2, ConflictKind, CsrConflict, M2Detail, PlantCsrData};
pub use m3_insect_control::{calculate_m3, M3Detail};
pub use m4_disease_control::{calculate_m4, M4Detail};
pub use m5_beneficial_fungi::{calculate_m5, FungusCategory, FungusClassification, M5Detail};
pub use m6_structural_diversity::{calculate_m6, M6Detail};
pub use m7_pollinator_support::{calculate_m7, M7Detail};

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, NormalizationError};
use crate::guild::Guild;
use crate::lookups::LookupTables;
use crate::utils::normalization::percentile_normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricId {
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricTier {
    /// M1-M4
    Universal,
    /// M5-M7
    Bonus,
}

impl MetricId {
    pub const ALL: [MetricId; 7] = [
        MetricId::M1,
        MetricId::M2,
        MetricId::M3,
        MetricId::M4,
        MetricId::M5,
        MetricId::M6,
        MetricId::M7,
    ];

    /// Key in the calibration JSON.
    pub fn calibration_key(self) -> &'static str {
        match self {
            MetricId::M1 => "m1",
            MetricId::M2 => "n4",
            MetricId::M3 => "p1",
            MetricId::M4 => "p2",
            MetricId::M5 => "p3",
            MetricId::M6 => "p5",
            MetricId::M7 => "p6",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricId::M1 => "Pest & Pathogen Independence",
            MetricId::M2 => "Growth Compatibility",
            MetricId::M3 => "Insect Pest Control",
            MetricId::M4 => "Disease Suppression",
            MetricId::M5 => "Beneficial Fungi Networks",
            MetricId::M6 => "Structural Diversity",
            MetricId::M7 => "Pollinator Support",
        }
    }

    pub fn tier(self) -> MetricTier {
        match self {
            MetricId::M1 | MetricId::M2 | MetricId::M3 | MetricId::M4 => MetricTier::Universal,
            MetricId::M5 | MetricId::M6 | MetricId::M7 => MetricTier::Bonus,
        }
    }

    /// Raw value is a risk, so the displayed score is `100 - percentile`.
    pub fn is_inverted(self) -> bool {
        matches!(self, MetricId::M1 | MetricId::M2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UncalibratedReason {
    Normalization(NormalizationError),
    /// No guild taxon could be placed in the phylogeny.
    NoPlacedTaxa,
}

/// Displayed 0-100 score, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetricScore {
    Scored(f64),
    /// Source data for the category was absent for every plant.
    NoData { category: String },
    Uncalibrated(UncalibratedReason),
}

impl MetricScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricScore::Scored(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, MetricScore::Scored(_))
    }
}

/// How an antagonist on one plant protects another plant from a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Mechanism {
    SpecificPredator,
    SpecificEntomopathogen,
    GeneralEntomopathogen,
    SpecificMycoparasite,
    SpecificFungivore,
    GeneralMycoparasite,
    GeneralFungivore,
}

impl Mechanism {
    pub fn weight(self) -> f64 {
        match self {
            Mechanism::SpecificPredator
            | Mechanism::SpecificEntomopathogen
            | Mechanism::SpecificMycoparasite
            | Mechanism::SpecificFungivore => 1.0,
            Mechanism::GeneralMycoparasite => 0.5,
            Mechanism::GeneralEntomopathogen | Mechanism::GeneralFungivore => 0.2,
        }
    }

    pub fn is_specific(self) -> bool {
        matches!(
            self,
            Mechanism::SpecificPredator
                | Mechanism::SpecificEntomopathogen
                | Mechanism::SpecificMycoparasite
                | Mechanism::SpecificFungivore
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Mechanism::SpecificPredator => "specific predator",
            Mechanism::SpecificEntomopathogen => "specific entomopathogenic fungus",
            Mechanism::GeneralEntomopathogen => "general entomopathogenic fungus",
            Mechanism::SpecificMycoparasite => "specific mycoparasite",
            Mechanism::SpecificFungivore => "specific fungivore",
            Mechanism::GeneralMycoparasite => "general mycoparasite",
            Mechanism::GeneralFungivore => "general fungivore",
        }
    }
}

/// Curated (threat, antagonist) match found in the guild.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MatchedPair {
    pub target: String,
    pub agent: String,
    pub mechanism: Mechanism,
}

/// Metric-specific explanation payload. Never feeds the score.
#[derive(Debug, Clone, Serialize)]
pub enum MetricDetail {
    M1(M1Detail),
    M2(M2Detail),
    M3(M3Detail),
    M4(M4Detail),
    M5(M5Detail),
    M6(M6Detail),
    M7(M7Detail),
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricResult {
    pub metric: MetricId,
    pub raw: f64,
    pub score: MetricScore,
    pub detail: MetricDetail,
}

impl MetricResult {
    /// Normalize `raw` against the guild's climate tier.
    pub(crate) fn normalized(
        metric: MetricId,
        raw: f64,
        detail: MetricDetail,
        guild: &Guild,
        lookups: &LookupTables,
    ) -> Self {
        let score = match percentile_normalize(raw, metric, lookups.calibration(), guild.climate_tier()) {
            Ok(pct) => {
                let display = if metric.is_inverted() { 100.0 - pct } else { pct };
                MetricScore::Scored(display.clamp(0.0, 100.0))
            }
            Err(e) => {
                tracing::warn!(metric = ?metric, tier = %guild.climate_tier(), error = %e, "metric uncalibrated");
                MetricScore::Uncalibrated(UncalibratedReason::Normalization(e))
            }
        };
        Self { metric, raw, score, detail }
    }

    pub(crate) fn no_data(metric: MetricId, category: &str, detail: MetricDetail) -> Self {
        Self {
            metric,
            raw: 0.0,
            score: MetricScore::NoData {
                category: category.to_string(),
            },
            detail,
        }
    }
}

/// Dispatch a metric by identity.
pub fn calculate(metric: MetricId, guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    match metric {
        MetricId::M1 => calculate_m1(guild, lookups),
        MetricId::M2 => calculate_m2(guild, lookups),
        MetricId::M3 => calculate_m3(guild, lookups),
        MetricId::M4 => calculate_m4(guild, lookups),
        MetricId::M5 => calculate_m5(guild, lookups),
        MetricId::M6 => calculate_m6(guild, lookups),
        MetricId::M7 => calculate_m7(guild, lookups),
    }
}
