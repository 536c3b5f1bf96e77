//! Guild Scorer - Main coordinator for scoring plant guilds
//!
//! Runs the seven metrics (fan-out on rayon, joined by metric identity),
//! aggregates the two-tier overall score and builds the network profiles.
//! A metric that errors or panics only loses its own slot.

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{DataPaths, ScoringConfig, TierWeights};
use crate::data::{load_lookup_tables, GuildData};
use crate::error::MetricError;
use crate::explanation::{
    analyze_biocontrol_network, analyze_fungi_network, analyze_guild_pests, analyze_pathogen_control_network,
    analyze_pollinator_network, guild_warnings, NetworkAnalysis, NetworkProfiles,
};
use crate::guild::Guild;
use crate::lookups::LookupTables;
use crate::metrics::{self, MetricDetail, MetricId, MetricResult, MetricScore, MetricTier};

/// Two-tier aggregate over the available metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallScore {
    /// `None` when no metric produced a score.
    pub score: Option<f64>,
    /// Mean of the available M1-M4 scores.
    pub universal: Option<f64>,
    /// Mean of the available M5-M7 scores.
    pub bonus: Option<f64>,
    pub available: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuildScoreResult {
    pub climate_tier: String,
    pub n_plants: usize,
    /// One slot per metric, always all seven.
    pub metrics: BTreeMap<MetricId, Result<MetricResult, MetricError>>,
    pub overall: OverallScore,
}

impl GuildScoreResult {
    pub fn metric(&self, id: MetricId) -> Option<&Result<MetricResult, MetricError>> {
        self.metrics.get(&id)
    }

    /// Displayed score of one metric, if it has one.
    pub fn score_of(&self, id: MetricId) -> Option<f64> {
        match self.metrics.get(&id) {
            Some(Ok(result)) => result.score.value(),
            _ => None,
        }
    }
}

/// Main guild scorer: guild tables plus shared lookups.
///
/// Lookups sit behind an `Arc` so several scorers (or threads) share one copy.
pub struct GuildScorer {
    data: GuildData,
    lookups: Arc<LookupTables>,
    config: ScoringConfig,
}

impl GuildScorer {
    pub fn new(data: GuildData, lookups: Arc<LookupTables>, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { data, lookups, config })
    }

    /// Load every table named in `paths`.
    pub fn load(paths: &DataPaths, config: ScoringConfig) -> Result<Self> {
        let data = GuildData::load(paths)?;
        let lookups = Arc::new(load_lookup_tables(paths)?);
        Self::new(data, lookups, config)
    }

    pub fn data(&self) -> &GuildData {
        &self.data
    }

    pub fn lookups(&self) -> &Arc<LookupTables> {
        &self.lookups
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a guild given by plant ids. Loader errors are fatal; metric
    /// errors stay in their slots.
    pub fn score<S: AsRef<str>>(&self, plant_ids: &[S], climate_tier: &str) -> Result<GuildScoreResult> {
        let guild = self.data.build_guild(plant_ids, climate_tier)?;
        Ok(score_guild(&guild, &self.lookups, &self.config))
    }

    /// Score and explain a guild in one call.
    pub fn score_with_profiles<S: AsRef<str>>(
        &self,
        plant_ids: &[S],
        climate_tier: &str,
    ) -> Result<(GuildScoreResult, NetworkProfiles)> {
        let guild = self.data.build_guild(plant_ids, climate_tier)?;
        let result = score_guild(&guild, &self.lookups, &self.config);
        let profiles = build_network_profiles(&guild, &result, &self.lookups, &self.config);
        Ok((result, profiles))
    }
}

/// Score a guild with all seven metrics.
#[tracing::instrument(skip_all, fields(n_plants = guild.len(), tier = %guild.climate_tier()))]
pub fn score_guild(guild: &Guild, lookups: &LookupTables, config: &ScoringConfig) -> GuildScoreResult {
    let run = |&id: &MetricId| (id, run_isolated(id, guild, lookups));
    let slots: Vec<(MetricId, Result<MetricResult, MetricError>)> = if config.parallel {
        MetricId::ALL.par_iter().map(run).collect()
    } else {
        MetricId::ALL.iter().map(run).collect()
    };
    let metrics: BTreeMap<_, _> = slots.into_iter().collect();

    let overall = overall_score(&metrics, config.tier_weights);
    tracing::debug!(score = ?overall.score, available = overall.available, "guild scored");

    GuildScoreResult {
        climate_tier: guild.climate_tier().to_string(),
        n_plants: guild.len(),
        metrics,
        overall,
    }
}

/// Run one metric, turning a panic into `MetricError::Panicked`.
fn run_isolated(id: MetricId, guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| metrics::calculate(id, guild, lookups)));
    tracing::debug!(metric = ?id, elapsed_us = start.elapsed().as_micros() as u64, "metric finished");

    let result = match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(MetricError::Panicked { metric: id, message })
        }
    };
    if let Err(e) = &result {
        tracing::warn!(metric = ?id, error = %e, "metric failed");
    }
    result
}

/// Weighted mean of the tier means. A tier with no available metric drops out
/// and the remaining weights are renormalized.
pub fn overall_score(
    metrics: &BTreeMap<MetricId, Result<MetricResult, MetricError>>,
    weights: TierWeights,
) -> OverallScore {
    let tier_mean = |tier: MetricTier| -> Option<f64> {
        let scores: Vec<f64> = metrics
            .iter()
            .filter(|(id, _)| id.tier() == tier)
            .filter_map(|(_, slot)| slot.as_ref().ok().and_then(|r| r.score.value()))
            .collect();
        (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
    };
    let universal = tier_mean(MetricTier::Universal);
    let bonus = tier_mean(MetricTier::Bonus);
    let available = metrics
        .values()
        .filter(|slot| matches!(slot, Ok(r) if r.score.is_available()))
        .count();

    let (sum, weight) = [(universal, weights.universal), (bonus, weights.bonus)]
        .into_iter()
        .filter_map(|(mean, w)| mean.map(|m| (m * w, w)))
        .fold((0.0, 0.0), |(s, tw), (v, w)| (s + v, tw + w));
    let score = (weight > 0.0).then(|| (sum / weight).clamp(0.0, 100.0));

    OverallScore {
        score,
        universal,
        bonus,
        available,
    }
}

/// Build all five network profiles from a finished scoring pass.
///
/// The pest profile reads raw herbivore lists; the other four need their
/// metric's side-channel and report `MetricFailed` when that metric errored.
pub fn build_network_profiles(
    guild: &Guild,
    result: &GuildScoreResult,
    lookups: &LookupTables,
    config: &ScoringConfig,
) -> NetworkProfiles {
    let top_n = config.top_n;

    let pest = || analyze_guild_pests(guild, lookups, top_n);
    let biocontrol = || {
        from_metric(result, MetricId::M3, |detail| match detail {
            MetricDetail::M3(d) => Some(analyze_biocontrol_network(guild, d, lookups, top_n)),
            _ => None,
        })
    };
    let pathogen_control = || {
        from_metric(result, MetricId::M4, |detail| match detail {
            MetricDetail::M4(d) => Some(analyze_pathogen_control_network(guild, d, lookups, top_n)),
            _ => None,
        })
    };
    let fungi = || {
        from_metric(result, MetricId::M5, |detail| match detail {
            MetricDetail::M5(d) => Some(analyze_fungi_network(guild, d, top_n)),
            _ => None,
        })
    };
    let pollinators = || {
        from_metric(result, MetricId::M7, |detail| match detail {
            MetricDetail::M7(d) => Some(analyze_pollinator_network(guild, d, lookups, top_n)),
            _ => None,
        })
    };

    let (pest, (biocontrol, (pathogen_control, (fungi, pollinators)))) = if config.parallel {
        rayon::join(pest, || {
            rayon::join(biocontrol, || rayon::join(pathogen_control, || rayon::join(fungi, pollinators)))
        })
    } else {
        (pest(), (biocontrol(), (pathogen_control(), (fungi(), pollinators()))))
    };

    NetworkProfiles {
        pest,
        biocontrol,
        pathogen_control,
        fungi,
        pollinators,
        warnings: guild_warnings(guild),
    }
}

fn from_metric<T>(
    result: &GuildScoreResult,
    id: MetricId,
    analyze: impl FnOnce(&MetricDetail) -> Option<T>,
) -> NetworkAnalysis<T> {
    match result.metric(id) {
        None => NetworkAnalysis::MetricFailed(format!("{:?} was not computed", id)),
        Some(Err(e)) => NetworkAnalysis::MetricFailed(e.to_string()),
        Some(Ok(MetricResult {
            score: MetricScore::NoData { .. },
            ..
        })) => NetworkAnalysis::NoData,
        Some(Ok(r)) => match analyze(&r.detail) {
            Some(profile) => NetworkAnalysis::Profile(profile),
            None => NetworkAnalysis::MetricFailed(format!("{:?} returned a mismatched detail", id)),
        },
    }
}
