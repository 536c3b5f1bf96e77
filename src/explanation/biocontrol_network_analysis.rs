//! Biocontrol Network Analysis for M3 (Insect Pest Control)
//!
//! Shows which plants attract beneficial predators and entomopathogenic
//! fungi, the generalist agents and the network hubs. Every agent is counted,
//! but only agents named in the curated predator / insect-parasite tables are
//! listed, so a pollinator that happens to share a predator column is never
//! shown as a predator.

use serde::Serialize;

use crate::explanation::types::{
    category_shares, plant_hubs, rank_hubs, rank_organisms, ranked_from_tally, CategoryShare, PlantHub,
    RankedOrganism,
};
use crate::explanation::unified_taxonomy::{OrganismCategory, OrganismRole};
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::metrics::{M3Detail, MatchedPair, Mechanism};
use crate::utils::organism_counter::count_shared_organisms;
use crate::utils::organism_matcher::canonical_name;

/// Matched biocontrol pair with categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedBiocontrolPair {
    /// Herbivore (pest)
    pub target: String,
    pub target_category: OrganismCategory,
    /// Predator or fungus
    pub agent: String,
    pub agent_category: OrganismCategory,
    pub mechanism: Mechanism,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiocontrolNetworkProfile {
    /// Every predator on the guild, known or not
    pub total_unique_predators: usize,
    pub total_unique_entomo_fungi: usize,
    pub specific_predator_matches: usize,
    pub specific_fungi_matches: usize,
    pub general_entomo_fungi_count: usize,
    pub matched_predator_pairs: Vec<MatchedBiocontrolPair>,
    pub matched_fungi_pairs: Vec<MatchedBiocontrolPair>,
    /// Over known predators only
    pub predator_categories: Vec<CategoryShare>,
    /// Over herbivores that have at least one matched agent
    pub herbivore_categories: Vec<CategoryShare>,
    pub top_predators: Vec<RankedOrganism>,
    pub top_entomo_fungi: Vec<RankedOrganism>,
    /// Plants ranked by known biocontrol agent count
    pub hub_plants: Vec<PlantHub>,
}

/// Analyze biocontrol network for M3
pub fn analyze_biocontrol_network(
    guild: &Guild,
    detail: &M3Detail,
    lookups: &LookupTables,
    top_n: usize,
) -> BiocontrolNetworkProfile {
    let categories = lookups.organism_categories();
    let known_predators = lookups.known_predators();
    let known_fungi = lookups.known_entomopathogens();

    let predator_tally = count_shared_organisms(guild, &Interaction::PREDATORS);
    let fungi_tally = count_shared_organisms(guild, &[Interaction::EntomopathogenicFungi]);

    let predators = ranked_from_tally(
        &predator_tally,
        guild,
        |key| known_predators.contains_key(key),
        |name| {
            OrganismCategory::from_name(name, categories, Some(OrganismRole::Predator))
                .display_name()
                .to_string()
        },
    );
    let entomo_fungi = ranked_from_tally(
        &fungi_tally,
        guild,
        |key| known_fungi.contains_key(key),
        |_| "Entomopathogenic Fungus".to_string(),
    );
    let predator_categories = category_shares(predators.iter().map(|p| p.category.as_str()));

    let pair = |p: &MatchedPair, agent_role: Option<OrganismRole>| MatchedBiocontrolPair {
        target: p.target.clone(),
        target_category: OrganismCategory::from_name(&p.target, categories, Some(OrganismRole::Herbivore)),
        agent: p.agent.clone(),
        agent_category: OrganismCategory::from_name(&p.agent, categories, agent_role),
        mechanism: p.mechanism,
    };
    let matched_predator_pairs: Vec<MatchedBiocontrolPair> = detail
        .matched_pairs
        .iter()
        .filter(|p| p.mechanism == Mechanism::SpecificPredator)
        .map(|p| pair(p, Some(OrganismRole::Predator)))
        .collect();
    let matched_fungi_pairs: Vec<MatchedBiocontrolPair> = detail
        .matched_pairs
        .iter()
        .filter(|p| p.mechanism == Mechanism::SpecificEntomopathogen)
        .map(|p| pair(p, None))
        .collect();

    // One entry per distinct matched herbivore
    let mut matched_herbivores: Vec<(String, &'static str)> = matched_predator_pairs
        .iter()
        .chain(&matched_fungi_pairs)
        .filter_map(|p| canonical_name(&p.target).map(|key| (key, p.target_category.display_name())))
        .collect();
    matched_herbivores.sort_unstable();
    matched_herbivores.dedup_by(|a, b| a.0 == b.0);
    let herbivore_categories = category_shares(matched_herbivores.iter().map(|(_, c)| *c));

    let hub_categories: Vec<Interaction> = Interaction::PREDATORS
        .into_iter()
        .chain([Interaction::EntomopathogenicFungi])
        .collect();
    let hubs = plant_hubs(guild, &hub_categories, |key| {
        known_predators.contains_key(key) || known_fungi.contains_key(key)
    });

    BiocontrolNetworkProfile {
        total_unique_predators: detail.predator_counts.len(),
        total_unique_entomo_fungi: detail.entomo_fungi_counts.len(),
        specific_predator_matches: detail.specific_predator_matches,
        specific_fungi_matches: detail.specific_fungi_matches,
        general_entomo_fungi_count: detail.general_fungi_matches,
        matched_predator_pairs,
        matched_fungi_pairs,
        predator_categories,
        herbivore_categories,
        top_predators: rank_organisms(predators, top_n),
        top_entomo_fungi: rank_organisms(entomo_fungi, top_n),
        hub_plants: rank_hubs(hubs, top_n),
    }
}
