//! Shared building blocks for network profiles.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::explanation::biocontrol_network_analysis::BiocontrolNetworkProfile;
use crate::explanation::fungi_network_analysis::FungiNetworkProfile;
use crate::explanation::pathogen_control_network_analysis::PathogenControlNetworkProfile;
use crate::explanation::pest_analysis::PestProfile;
use crate::explanation::pollinator_network_analysis::PollinatorNetworkProfile;
use crate::guild::{Guild, Interaction};
use crate::utils::organism_counter::OrganismTally;
use crate::utils::organism_matcher::keyed_names;

/// Outcome of one analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NetworkAnalysis<T> {
    Profile(T),
    /// The source organism lists are absent for every plant.
    NoData,
    /// The metric this analyzer depends on failed.
    MetricFailed(String),
}

impl<T> NetworkAnalysis<T> {
    pub fn profile(&self) -> Option<&T> {
        match self {
            NetworkAnalysis::Profile(p) => Some(p),
            _ => None,
        }
    }
}

/// All five analyses for one guild, plus its guild-level warnings.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkProfiles {
    pub pest: NetworkAnalysis<PestProfile>,
    pub biocontrol: NetworkAnalysis<BiocontrolNetworkProfile>,
    pub pathogen_control: NetworkAnalysis<PathogenControlNetworkProfile>,
    pub fungi: NetworkAnalysis<FungiNetworkProfile>,
    pub pollinators: NetworkAnalysis<PollinatorNetworkProfile>,
    pub warnings: Vec<WarningCard>,
}

/// Severity level for warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NitrogenExcess,
    PhIncompatible,
    NoSharedClimate,
    CalibrationTierOutsideRange,
}

/// Guild-level warning that sits outside the seven metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningCard {
    pub warning_type: WarningKind,
    pub severity: Severity,
    pub message: String,
    pub detail: String,
    pub advice: String,
}

/// Organism ranked by how many guild plants share it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOrganism {
    pub name: String,
    pub category: String,
    pub plant_count: usize,
    /// Display names of the host plants, in guild order.
    pub plants: Vec<String>,
    /// plant_count / guild size
    pub network_contribution: f64,
}

/// Per-plant organism count for one network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantHub {
    pub plant_name: String,
    pub organism_count: usize,
    /// False when every source list for this plant is absent.
    pub has_data: bool,
}

/// Share of a category among the distinct organisms of a network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
}

/// Count descending, then name ascending.
pub fn rank_organisms(mut organisms: Vec<RankedOrganism>, top_n: usize) -> Vec<RankedOrganism> {
    organisms.sort_by(|a, b| b.plant_count.cmp(&a.plant_count).then_with(|| a.name.cmp(&b.name)));
    organisms.truncate(top_n);
    organisms
}

/// Same ordering rule as `rank_organisms`, applied to plants.
pub fn rank_hubs(mut hubs: Vec<PlantHub>, top_n: usize) -> Vec<PlantHub> {
    hubs.sort_by(|a, b| {
        b.organism_count
            .cmp(&a.organism_count)
            .then_with(|| a.plant_name.cmp(&b.plant_name))
    });
    hubs.truncate(top_n);
    hubs
}

/// Ranked entries for every organism in `tally` accepted by `keep`.
pub fn ranked_from_tally(
    tally: &OrganismTally,
    guild: &Guild,
    mut keep: impl FnMut(&str) -> bool,
    mut categorize: impl FnMut(&str) -> String,
) -> Vec<RankedOrganism> {
    let n = guild.len() as f64;
    let plants = guild.plants();
    tally
        .iter()
        .filter(|(key, _)| keep(*key))
        .map(|(_, entry)| RankedOrganism {
            name: entry.display_name.clone(),
            category: categorize(&entry.display_name),
            plant_count: entry.plant_count(),
            plants: entry.plants.iter().map(|&i| plants[i].display_name()).collect(),
            network_contribution: entry.plant_count() as f64 / n,
        })
        .collect()
}

/// One hub per plant: distinct organisms across `categories` accepted by `keep`
/// (which sees canonical keys).
pub fn plant_hubs(guild: &Guild, categories: &[Interaction], mut keep: impl FnMut(&str) -> bool) -> Vec<PlantHub> {
    guild
        .plants()
        .iter()
        .map(|plant| PlantHub {
            plant_name: plant.display_name(),
            organism_count: keyed_names(plant.organisms_in(categories))
                .iter()
                .filter(|(key, _)| keep(key.as_str()))
                .count(),
            has_data: plant.has_any(categories),
        })
        .collect()
}

/// Category composition over distinct organisms, ordered by count then name.
pub fn category_shares<'a>(categories: impl IntoIterator<Item = &'a str>) -> Vec<CategoryShare> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for category in categories {
        *counts.entry(category).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();
    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            count,
            percentage: if total > 0 {
                100.0 * count as f64 / total as f64
            } else {
                0.0
            },
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    shares
}
