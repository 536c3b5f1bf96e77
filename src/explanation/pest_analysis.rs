//! Pest profile for a guild
//!
//! Built straight from the herbivore lists, not from a metric. Identifies
//! shared pests (generalists attacking 2+ plants), the top pests by plant
//! count and the most vulnerable plants.

use serde::Serialize;

use crate::explanation::types::{
    category_shares, plant_hubs, rank_hubs, rank_organisms, ranked_from_tally, CategoryShare, NetworkAnalysis,
    PlantHub, RankedOrganism,
};
use crate::explanation::unified_taxonomy::{OrganismCategory, OrganismRole};
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::utils::organism_counter::count_shared_organisms;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PestProfile {
    pub total_unique_pests: usize,
    /// Pests on 2+ plants, most generalist first
    pub shared_pests: Vec<RankedOrganism>,
    pub top_pests: Vec<RankedOrganism>,
    /// Plants ranked by distinct herbivore count
    pub vulnerable_plants: Vec<PlantHub>,
    pub category_composition: Vec<CategoryShare>,
}

/// Analyze pest profile for a guild.
///
/// `NoData` only when no plant carries a herbivore list at all; a guild whose
/// lists are all empty gets a profile with zero pests.
pub fn analyze_guild_pests(guild: &Guild, lookups: &LookupTables, top_n: usize) -> NetworkAnalysis<PestProfile> {
    const HERBIVORES: [Interaction; 1] = [Interaction::Herbivores];

    if !guild.has_category_data(&HERBIVORES) {
        return NetworkAnalysis::NoData;
    }

    let categories = lookups.organism_categories();
    let categorize =
        |name: &str| OrganismCategory::from_name(name, categories, Some(OrganismRole::Herbivore)).display_name();

    let tally = count_shared_organisms(guild, &HERBIVORES);
    let all = ranked_from_tally(&tally, guild, |_| true, |name| categorize(name).to_string());

    let shared_pests = rank_organisms(
        all.iter().filter(|o| o.plant_count >= 2).cloned().collect(),
        usize::MAX,
    );
    let category_composition = category_shares(all.iter().map(|o| o.category.as_str()));
    let top_pests = rank_organisms(all, top_n);

    NetworkAnalysis::Profile(PestProfile {
        total_unique_pests: tally.len(),
        shared_pests,
        top_pests,
        vulnerable_plants: rank_hubs(plant_hubs(guild, &HERBIVORES, |_| true), top_n),
        category_composition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::PlantRecord;

    fn guild(plants: Vec<PlantRecord>) -> Guild {
        Guild::new(plants, "tier_3_humid_temperate").unwrap()
    }

    #[test]
    fn shared_and_top_pests() {
        let g = guild(vec![
            PlantRecord::new("a", "Plant A").with_organisms(Interaction::Herbivores, ["Aphis fabae", "Sitona lineatus"]),
            PlantRecord::new("b", "Plant B").with_organisms(Interaction::Herbivores, ["aphis fabae", "Pieris rapae"]),
            PlantRecord::new("c", "Plant C").with_organisms(Interaction::Herbivores, ["Sitona lineatus"]),
        ]);
        let NetworkAnalysis::Profile(profile) = analyze_guild_pests(&g, &LookupTables::default(), 10) else {
            panic!("expected a profile");
        };
        assert_eq!(profile.total_unique_pests, 3);
        assert_eq!(profile.shared_pests.len(), 2);
        assert_eq!(profile.top_pests[0].name, "Aphis fabae");
        assert_eq!(profile.top_pests[0].plant_count, 2);
        assert_eq!(profile.top_pests[0].plants, vec!["Plant A", "Plant B"]);
        assert_eq!(profile.top_pests[0].category, "Aphids");
        assert_eq!(profile.vulnerable_plants[0].plant_name, "Plant A");
        assert_eq!(profile.vulnerable_plants[0].organism_count, 2);
    }

    #[test]
    fn absent_column_is_no_data() {
        let g = guild(vec![PlantRecord::new("x", "PlantX"), PlantRecord::new("y", "PlantY")]);
        assert_eq!(analyze_guild_pests(&g, &LookupTables::default(), 10), NetworkAnalysis::NoData);
    }

    #[test]
    fn empty_lists_are_zero_pests() {
        let g = guild(vec![
            PlantRecord::new("x", "PlantX").with_organisms(Interaction::Herbivores, Vec::<String>::new()),
            PlantRecord::new("y", "PlantY"),
        ]);
        let NetworkAnalysis::Profile(profile) = analyze_guild_pests(&g, &LookupTables::default(), 10) else {
            panic!("expected a profile");
        };
        assert_eq!(profile.total_unique_pests, 0);
        assert!(profile.top_pests.is_empty());
        let hub_x = profile.vulnerable_plants.iter().find(|h| h.plant_name == "PlantX").unwrap();
        let hub_y = profile.vulnerable_plants.iter().find(|h| h.plant_name == "PlantY").unwrap();
        assert!(hub_x.has_data);
        assert!(!hub_y.has_data);
    }
}
