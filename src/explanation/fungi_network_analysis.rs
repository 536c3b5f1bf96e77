//! Fungi Network Profile Analysis
//!
//! Breakdown of the beneficial fungi network behind M5:
//! - fungal diversity by category (AMF, EMF, endophytic, saprotrophic)
//! - top network fungi ranked by connectivity
//! - plant fungal hubs ranked by total associations
//!
//! Categories are additive. A fungus listed as both AMF and endophytic counts
//! in both, and dual-lifestyle fungi (also pathogenic somewhere in the guild)
//! are flagged rather than dropped.

use serde::Serialize;

use crate::guild::{Guild, Interaction};
use crate::metrics::{FungusCategory, M5Detail};
use crate::utils::organism_counter::count_shared_organisms;
use crate::utils::organism_matcher::keyed_names;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkFungus {
    pub fungus_name: String,
    pub plant_count: usize,
    pub plants: Vec<String>,
    pub categories: Vec<FungusCategory>,
    /// plant_count / guild size
    pub network_contribution: f64,
    pub is_dual_lifestyle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopFungusInCategory {
    pub category: FungusCategory,
    pub fungus_name: String,
    pub plant_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FungiByCategoryProfile {
    pub amf_count: usize,
    pub emf_count: usize,
    pub endophytic_count: usize,
    pub saprotrophic_count: usize,
    pub dual_lifestyle_count: usize,
    /// Most connected fungus in each category
    pub top_per_category: Vec<TopFungusInCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantFungalHub {
    pub plant_name: String,
    /// Distinct beneficial fungi
    pub fungus_count: usize,
    pub amf_count: usize,
    pub emf_count: usize,
    pub endophytic_count: usize,
    pub saprotrophic_count: usize,
    pub has_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FungiNetworkProfile {
    pub total_unique_fungi: usize,
    /// Fungi connecting 2+ plants
    pub shared_fungi: Vec<NetworkFungus>,
    pub top_fungi: Vec<NetworkFungus>,
    pub fungi_by_category: FungiByCategoryProfile,
    pub hub_plants: Vec<PlantFungalHub>,
}

/// Analyze fungi network for a guild from the M5 side-channel.
pub fn analyze_fungi_network(guild: &Guild, detail: &M5Detail, top_n: usize) -> FungiNetworkProfile {
    let n = guild.len() as f64;
    let plants = guild.plants();
    let tally = count_shared_organisms(guild, &Interaction::BENEFICIAL_FUNGI);

    let mut fungi: Vec<NetworkFungus> = tally
        .iter()
        .map(|(_, entry)| {
            let classification = detail.classifications.get(&entry.display_name);
            NetworkFungus {
                fungus_name: entry.display_name.clone(),
                plant_count: entry.plant_count(),
                plants: entry.plants.iter().map(|&i| plants[i].display_name()).collect(),
                categories: classification
                    .map(|c| c.categories.iter().copied().collect())
                    .unwrap_or_default(),
                network_contribution: entry.plant_count() as f64 / n,
                is_dual_lifestyle: classification.map_or(false, |c| c.is_dual_lifestyle),
            }
        })
        .collect();
    fungi.sort_by(|a, b| {
        b.plant_count
            .cmp(&a.plant_count)
            .then_with(|| a.fungus_name.cmp(&b.fungus_name))
    });

    let in_category = |cat: FungusCategory| fungi.iter().filter(move |f| f.categories.contains(&cat));
    let fungi_by_category = FungiByCategoryProfile {
        amf_count: in_category(FungusCategory::AMF).count(),
        emf_count: in_category(FungusCategory::EMF).count(),
        endophytic_count: in_category(FungusCategory::Endophytic).count(),
        saprotrophic_count: in_category(FungusCategory::Saprotrophic).count(),
        dual_lifestyle_count: fungi.iter().filter(|f| f.is_dual_lifestyle).count(),
        // Already sorted, so the first fungus per category is the most connected
        top_per_category: FungusCategory::ALL
            .into_iter()
            .filter_map(|cat| {
                in_category(cat).next().map(|f| TopFungusInCategory {
                    category: cat,
                    fungus_name: f.fungus_name.clone(),
                    plant_count: f.plant_count,
                })
            })
            .collect(),
    };

    let shared_fungi: Vec<NetworkFungus> = fungi.iter().filter(|f| f.plant_count >= 2).cloned().collect();
    let mut top_fungi = fungi;
    top_fungi.truncate(top_n);

    let mut hub_plants: Vec<PlantFungalHub> = plants
        .iter()
        .map(|plant| {
            let count = |cat: FungusCategory| keyed_names(plant.organisms_of(cat.interaction())).len();
            PlantFungalHub {
                plant_name: plant.display_name(),
                fungus_count: keyed_names(plant.organisms_in(&Interaction::BENEFICIAL_FUNGI)).len(),
                amf_count: count(FungusCategory::AMF),
                emf_count: count(FungusCategory::EMF),
                endophytic_count: count(FungusCategory::Endophytic),
                saprotrophic_count: count(FungusCategory::Saprotrophic),
                has_data: plant.has_any(&Interaction::BENEFICIAL_FUNGI),
            }
        })
        .collect();
    hub_plants.sort_by(|a, b| {
        b.fungus_count
            .cmp(&a.fungus_count)
            .then_with(|| a.plant_name.cmp(&b.plant_name))
    });
    hub_plants.truncate(top_n);

    FungiNetworkProfile {
        total_unique_fungi: detail.fungi_counts.len(),
        shared_fungi,
        top_fungi,
        fungi_by_category,
        hub_plants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::PlantRecord;
    use crate::lookups::LookupTables;
    use crate::metrics::{calculate_m5, MetricDetail};

    fn profile(guild: &Guild) -> FungiNetworkProfile {
        // Score is irrelevant here; uncalibrated still carries the detail
        let result = calculate_m5(guild, &LookupTables::default()).unwrap();
        let MetricDetail::M5(detail) = &result.detail else {
            panic!("wrong detail");
        };
        analyze_fungi_network(guild, detail, 10)
    }

    #[test]
    fn dual_lifestyle_fungus_is_flagged_and_kept() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "Rubus idaeus")
                    .with_organisms(Interaction::SaprotrophicFungi, ["Fusarium oxysporum"])
                    .with_organisms(Interaction::PathogenicFungi, ["Fusarium oxysporum"]),
                PlantRecord::new("b", "Malus domestica")
                    .with_organisms(Interaction::SaprotrophicFungi, ["Fusarium oxysporum"])
                    .with_organisms(Interaction::AmfFungi, ["Glomus mosseae"]),
            ],
            "tier_3_humid_temperate",
        )
        .unwrap();
        let p = profile(&guild);
        assert_eq!(p.total_unique_fungi, 2);
        assert_eq!(p.shared_fungi.len(), 1);
        let fusarium = &p.shared_fungi[0];
        assert_eq!(fusarium.fungus_name, "Fusarium oxysporum");
        assert!(fusarium.is_dual_lifestyle);
        assert_eq!(fusarium.categories, vec![FungusCategory::Saprotrophic]);
        assert_eq!(p.fungi_by_category.dual_lifestyle_count, 1);
        assert_eq!(p.fungi_by_category.amf_count, 1);
    }

    #[test]
    fn additive_categories_and_hubs() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A")
                    .with_organisms(Interaction::AmfFungi, ["Glomus mosseae"])
                    .with_organisms(Interaction::EndophyticFungi, ["glomus mosseae", "Epichloe festucae"]),
                PlantRecord::new("b", "B"),
            ],
            "tier_3_humid_temperate",
        )
        .unwrap();
        let p = profile(&guild);
        assert_eq!(p.fungi_by_category.amf_count, 1);
        assert_eq!(p.fungi_by_category.endophytic_count, 2);

        assert_eq!(p.hub_plants[0].plant_name, "A");
        assert_eq!(p.hub_plants[0].fungus_count, 2);
        assert_eq!(p.hub_plants[0].endophytic_count, 2);
        assert!(!p.hub_plants[1].has_data);
    }
}
