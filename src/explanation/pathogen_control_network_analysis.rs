//! Pathogen Control Network Analysis for M4 (Disease Suppression)
//!
//! Which plants harbor mycoparasites and fungivores that suppress pathogens,
//! the generalist antagonists and the protection hubs. Listings are limited
//! to antagonists named in the curated pathogen-antagonist table.

use serde::Serialize;

use crate::explanation::types::{plant_hubs, rank_hubs, rank_organisms, ranked_from_tally, PlantHub, RankedOrganism};
use crate::explanation::unified_taxonomy::{OrganismCategory, OrganismRole};
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::metrics::{M4Detail, Mechanism};
use crate::utils::organism_counter::count_shared_organisms;

/// (pathogen, antagonist) match; fungivores carry an animal category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedAntagonistPair {
    pub pathogen: String,
    pub antagonist: String,
    pub mechanism: Mechanism,
    pub antagonist_category: Option<OrganismCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathogenControlNetworkProfile {
    pub total_unique_mycoparasites: usize,
    pub total_unique_fungivores: usize,
    pub total_unique_pathogens: usize,
    pub specific_antagonist_matches: usize,
    pub specific_fungivore_matches: usize,
    pub general_mycoparasite_count: usize,
    pub general_fungivore_count: usize,
    pub matched_pairs: Vec<MatchedAntagonistPair>,
    pub top_mycoparasites: Vec<RankedOrganism>,
    pub top_fungivores: Vec<RankedOrganism>,
    /// Pathogens ranked by how many guild plants they attack
    pub top_pathogens: Vec<RankedOrganism>,
    /// Plants ranked by known antagonist count
    pub hub_plants: Vec<PlantHub>,
}

/// Analyze pathogen control network for M4
pub fn analyze_pathogen_control_network(
    guild: &Guild,
    detail: &M4Detail,
    lookups: &LookupTables,
    top_n: usize,
) -> PathogenControlNetworkProfile {
    let categories = lookups.organism_categories();
    let known = lookups.known_antagonists();

    let mycoparasites = ranked_from_tally(
        &count_shared_organisms(guild, &[Interaction::MycoparasiteFungi]),
        guild,
        |key| known.contains_key(key),
        |_| "Mycoparasite".to_string(),
    );
    let fungivores = ranked_from_tally(
        &count_shared_organisms(guild, &[Interaction::Fungivores]),
        guild,
        |key| known.contains_key(key),
        |name| {
            OrganismCategory::from_name(name, categories, Some(OrganismRole::Predator))
                .display_name()
                .to_string()
        },
    );
    let pathogens = ranked_from_tally(
        &count_shared_organisms(guild, &[Interaction::PathogenicFungi]),
        guild,
        |_| true,
        |_| "Pathogenic Fungus".to_string(),
    );

    let matched_pairs = detail
        .matched_pairs
        .iter()
        .map(|p| MatchedAntagonistPair {
            pathogen: p.target.clone(),
            antagonist: p.agent.clone(),
            mechanism: p.mechanism,
            antagonist_category: (p.mechanism == Mechanism::SpecificFungivore)
                .then(|| OrganismCategory::from_name(&p.agent, categories, Some(OrganismRole::Predator))),
        })
        .collect();

    let hubs = plant_hubs(
        guild,
        &[Interaction::MycoparasiteFungi, Interaction::Fungivores],
        |key| known.contains_key(key),
    );

    PathogenControlNetworkProfile {
        total_unique_mycoparasites: detail.mycoparasite_counts.len(),
        total_unique_fungivores: detail.fungivore_counts.len(),
        total_unique_pathogens: detail.pathogen_counts.len(),
        specific_antagonist_matches: detail.specific_antagonist_matches,
        specific_fungivore_matches: detail.specific_fungivore_matches,
        general_mycoparasite_count: detail.general_mycoparasite_matches,
        general_fungivore_count: detail.general_fungivore_matches,
        matched_pairs,
        top_mycoparasites: rank_organisms(mycoparasites, top_n),
        top_fungivores: rank_organisms(fungivores, top_n),
        top_pathogens: rank_organisms(pathogens, top_n),
        hub_plants: rank_hubs(hubs, top_n),
    }
}
