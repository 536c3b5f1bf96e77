//! M1: Pest & Pathogen Independence
//!
//! Scores phylogenetic diversity using Faith's PD as a proxy for pest/pathogen
//! risk reduction. Higher diversity (more evolutionary distance) = lower risk.
//!
//! Ecological Rationale:
//! - Host specificity: Most pests are genus/family-specific
//! - Dilution effect: Non-host plants reduce pest transmission
//! - Associational resistance: Non-hosts interfere with pest foraging

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::Path;

use crate::error::MetricError;
use crate::guild::Guild;
use crate::lookups::LookupTables;
use crate::metrics::{MetricDetail, MetricId, MetricResult, MetricScore, UncalibratedReason};
use crate::utils::newick::PhyloTree;

/// Decay constant for the PD -> risk transform.
const K: f64 = 0.001;

/// Faith's PD over a shared, read-only phylogeny.
#[derive(Debug, Clone, Default)]
pub struct PhyloPDCalculator {
    tree: PhyloTree,
    /// Plant identifier -> tree tip label.
    id_to_tip: FxHashMap<String, String>,
}

/// PD plus how many guild taxa were found in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdOutcome {
    pub faiths_pd: f64,
    pub placed: usize,
}

impl PhyloPDCalculator {
    pub fn new(tree: PhyloTree, id_to_tip: FxHashMap<String, String>) -> Self {
        Self { tree, id_to_tip }
    }

    /// Load the Newick tree and an optional identifier -> tip mapping CSV.
    pub fn load(tree_path: impl AsRef<Path>, mapping_path: Option<&Path>) -> Result<Self> {
        let tree = PhyloTree::from_file(tree_path)?;
        let id_to_tip = match mapping_path {
            Some(path) => Self::load_mapping(path)?,
            None => FxHashMap::default(),
        };
        tracing::info!(tips = tree.n_tips(), mappings = id_to_tip.len(), "phylogeny loaded");
        Ok(Self::new(tree, id_to_tip))
    }

    /// Mapping CSV with `wfo_taxon_id` and `tree_tip` columns; "NA" tips are skipped.
    fn load_mapping(path: &Path) -> Result<FxHashMap<String, String>> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to read tip mapping: {}", path.display()))?;

        let ids = df.column("wfo_taxon_id")?.str()?;
        let tips = df.column("tree_tip")?.str()?;

        let mut mapping = FxHashMap::default();
        for (id, tip) in ids.into_iter().zip(tips.into_iter()) {
            if let (Some(id), Some(tip)) = (id, tip) {
                let tip = tip.trim();
                if !tip.is_empty() && tip != "NA" {
                    mapping.insert(id.to_string(), tip.to_string());
                }
            }
        }
        Ok(mapping)
    }

    /// Tip node for a plant: mapped tip label first, then the identifier itself.
    fn tip_for(&self, plant_id: &str) -> Option<usize> {
        self.id_to_tip
            .get(plant_id)
            .and_then(|label| self.tree.tip(label).or_else(|| self.tree.tip(&label.replace('_', " "))))
            .or_else(|| self.tree.tip(plant_id))
    }

    /// Faith's PD for the placed subset of `plant_ids`. Unplaced taxa are ignored.
    pub fn calculate_pd(&self, plant_ids: &[&str]) -> PdOutcome {
        let tips: Vec<usize> = plant_ids.iter().filter_map(|id| self.tip_for(id)).collect();
        PdOutcome {
            faiths_pd: self.tree.faiths_pd(&tips),
            placed: tips.len(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct M1Detail {
    pub faiths_pd: f64,
    pub taxa_placed: usize,
    pub taxa_total: usize,
}

/// Calculate M1: Pest & Pathogen Independence
///
/// 1. Faith's PD over guild taxa placed in the tree
/// 2. pest_risk = exp(-K × PD)
/// 3. Display score = 100 - percentile(pest_risk)
///
/// A single plant has maximum risk and the minimum score without any lookup.
/// A guild with no placed taxa is uncalibrated rather than zero.
pub fn calculate_m1(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    let ids = guild.plant_ids();

    if guild.len() < 2 {
        return Ok(MetricResult {
            metric: MetricId::M1,
            raw: 1.0,
            score: MetricScore::Scored(0.0),
            detail: MetricDetail::M1(M1Detail {
                faiths_pd: 0.0,
                taxa_placed: lookups.phylo().calculate_pd(&ids).placed,
                taxa_total: 1,
            }),
        });
    }

    let outcome = lookups.phylo().calculate_pd(&ids);
    let detail = M1Detail {
        faiths_pd: outcome.faiths_pd,
        taxa_placed: outcome.placed,
        taxa_total: ids.len(),
    };

    if outcome.placed == 0 {
        tracing::warn!(n_plants = ids.len(), "no guild taxa placed in phylogeny");
        return Ok(MetricResult {
            metric: MetricId::M1,
            raw: 1.0,
            score: MetricScore::Uncalibrated(UncalibratedReason::NoPlacedTaxa),
            detail: MetricDetail::M1(detail),
        });
    }

    // PD = 0 -> risk 1.0; PD = 500 -> 0.61; PD = 1000 -> 0.37
    let pest_risk = (-K * outcome.faiths_pd).exp();

    Ok(MetricResult::normalized(
        MetricId::M1,
        pest_risk,
        MetricDetail::M1(detail),
        guild,
        lookups,
    ))
}
