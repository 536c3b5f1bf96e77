//! Pollinator Network Profile Analysis
//!
//! Which pollinators the guild shares, grouped into coarse categories
//! (bees, flies, butterflies, ...), plus the plants that attract the most.
//! Works on the same pest-filtered tally as M7.

use serde::Serialize;

use crate::explanation::types::{
    category_shares, plant_hubs, rank_hubs, rank_organisms, ranked_from_tally, CategoryShare, PlantHub,
    RankedOrganism,
};
use crate::explanation::unified_taxonomy::PollinatorCategory;
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::metrics::m7_pollinator_support::pollinator_tally;
use crate::metrics::M7Detail;
use crate::utils::organism_matcher::NameSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPollinatorInCategory {
    pub category: PollinatorCategory,
    pub pollinator_name: String,
    pub plant_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollinatorNetworkProfile {
    pub total_unique_pollinators: usize,
    /// Pollinators visiting 2+ plants
    pub shared_pollinators: Vec<RankedOrganism>,
    pub top_pollinators: Vec<RankedOrganism>,
    pub category_composition: Vec<CategoryShare>,
    pub top_per_category: Vec<TopPollinatorInCategory>,
    pub hub_plants: Vec<PlantHub>,
    /// Also listed as herbivores, so left out of everything above
    pub excluded_pests: Vec<String>,
}

/// Analyze pollinator network for M7
pub fn analyze_pollinator_network(
    guild: &Guild,
    detail: &M7Detail,
    lookups: &LookupTables,
    top_n: usize,
) -> PollinatorNetworkProfile {
    let curated = lookups.organism_categories();
    let (tally, excluded_pests) = pollinator_tally(guild);

    let all = rank_organisms(
        ranked_from_tally(&tally, guild, |_| true, |name| {
            PollinatorCategory::from_name(name, curated).display_name().to_string()
        }),
        usize::MAX,
    );

    let mut top_per_category: Vec<TopPollinatorInCategory> = Vec::new();
    for organism in &all {
        let category = PollinatorCategory::from_name(&organism.name, curated);
        // `all` is ranked, so the first hit per category is its best
        if !top_per_category.iter().any(|t| t.category == category) {
            top_per_category.push(TopPollinatorInCategory {
                category,
                pollinator_name: organism.name.clone(),
                plant_count: organism.plant_count,
            });
        }
    }
    top_per_category.sort_by_key(|t| t.category);

    let pests: NameSet = excluded_pests.iter().collect();
    let hubs = plant_hubs(guild, &[Interaction::Pollinators], |key| !pests.contains_key(key));

    let shared_pollinators = all.iter().filter(|o| o.plant_count >= 2).cloned().collect();
    let category_composition = category_shares(all.iter().map(|o| o.category.as_str()));

    PollinatorNetworkProfile {
        total_unique_pollinators: detail.pollinator_counts.len(),
        shared_pollinators,
        top_pollinators: rank_organisms(all, top_n),
        category_composition,
        top_per_category,
        hub_plants: rank_hubs(hubs, top_n),
        excluded_pests,
    }
}
