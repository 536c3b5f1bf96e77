//! M3: Insect Pest Control (Biocontrol)
//!
//! Scores natural pest control provided by predators and entomopathogenic
//! fungi. Each ordered pair (vulnerable plant A, protective plant B) is
//! checked: A's herbivores are looked up in the curated predator and insect
//! parasite tables and matched against B's predators and entomopathogenic
//! fungi.
//!
//! Weights:
//! - specific predator of one of A's herbivores: 1.0
//! - specific entomopathogenic fungus of one of A's herbivores: 1.0
//! - any other entomopathogenic fungus on B: 0.2
//!
//! Raw score = total weight / guild size.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::MetricError;
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::metrics::{MatchedPair, Mechanism, MetricDetail, MetricId, MetricResult};
use crate::utils::organism_counter::count_shared_organisms;
use crate::utils::organism_matcher::keyed_names;

#[derive(Debug, Clone, Default, Serialize)]
pub struct M3Detail {
    /// Sum of weighted links before dividing by guild size.
    pub biocontrol_raw: f64,
    /// Number of weighted links found.
    pub n_mechanisms: usize,
    /// Every predator on the guild -> plant count.
    pub predator_counts: BTreeMap<String, usize>,
    /// Every entomopathogenic fungus on the guild -> plant count.
    pub entomo_fungi_counts: BTreeMap<String, usize>,
    pub herbivore_counts: BTreeMap<String, usize>,
    pub specific_predator_matches: usize,
    pub specific_fungi_matches: usize,
    pub general_fungi_matches: usize,
    /// Deduplicated, sorted (herbivore, agent, mechanism) matches.
    pub matched_pairs: Vec<MatchedPair>,
}

/// Calculate M3: Insect Pest Control
///
/// "No data" when herbivore lists are absent for the whole guild, or when no
/// plant carries any predator or entomopathogen column.
pub fn calculate_m3(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    let mut agent_categories = Interaction::PREDATORS.to_vec();
    agent_categories.push(Interaction::EntomopathogenicFungi);

    if !guild.has_category_data(&[Interaction::Herbivores]) {
        return Ok(MetricResult::no_data(
            MetricId::M3,
            "herbivores",
            MetricDetail::M3(M3Detail::default()),
        ));
    }
    if !guild.has_category_data(&agent_categories) {
        return Ok(MetricResult::no_data(
            MetricId::M3,
            "predators and entomopathogenic fungi",
            MetricDetail::M3(M3Detail::default()),
        ));
    }

    let plants = guild.plants();
    let herbivores: Vec<Vec<(String, &str)>> = plants
        .iter()
        .map(|p| keyed_names(p.organisms_in(&[Interaction::Herbivores])))
        .collect();
    let predators: Vec<Vec<(String, &str)>> = plants
        .iter()
        .map(|p| keyed_names(p.organisms_in(&Interaction::PREDATORS)))
        .collect();
    let fungi: Vec<Vec<(String, &str)>> = plants
        .iter()
        .map(|p| keyed_names(p.organisms_in(&[Interaction::EntomopathogenicFungi])))
        .collect();

    let mut detail = M3Detail::default();
    let mut pairs: Vec<MatchedPair> = Vec::new();

    for (a, herbivores_a) in herbivores.iter().enumerate() {
        if herbivores_a.is_empty() {
            continue;
        }
        for b in 0..plants.len() {
            if a == b {
                continue;
            }

            // Specific predators
            for (_, herbivore) in herbivores_a {
                let Some(known) = lookups.herbivore_predators().get(herbivore) else {
                    continue;
                };
                for (key, predator) in &predators[b] {
                    if known.contains_key(key) {
                        detail.biocontrol_raw += Mechanism::SpecificPredator.weight();
                        detail.n_mechanisms += 1;
                        detail.specific_predator_matches += 1;
                        pairs.push(MatchedPair {
                            target: herbivore.trim().to_string(),
                            agent: predator.trim().to_string(),
                            mechanism: Mechanism::SpecificPredator,
                        });
                    }
                }
            }

            // Specific entomopathogens, remembering which fungi matched
            let mut specific: FxHashSet<&str> = FxHashSet::default();
            for (_, herbivore) in herbivores_a {
                let Some(known) = lookups.insect_parasites().get(herbivore) else {
                    continue;
                };
                for (key, fungus) in &fungi[b] {
                    if known.contains_key(key) {
                        detail.biocontrol_raw += Mechanism::SpecificEntomopathogen.weight();
                        detail.n_mechanisms += 1;
                        detail.specific_fungi_matches += 1;
                        specific.insert(key.as_str());
                        pairs.push(MatchedPair {
                            target: herbivore.trim().to_string(),
                            agent: fungus.trim().to_string(),
                            mechanism: Mechanism::SpecificEntomopathogen,
                        });
                    }
                }
            }

            // General entomopathogens: everything else on B
            for (key, _) in &fungi[b] {
                if !specific.contains(key.as_str()) {
                    detail.biocontrol_raw += Mechanism::GeneralEntomopathogen.weight();
                    detail.n_mechanisms += 1;
                    detail.general_fungi_matches += 1;
                }
            }
        }
    }

    pairs.sort_unstable();
    pairs.dedup();
    detail.matched_pairs = pairs;
    detail.predator_counts = count_shared_organisms(guild, &Interaction::PREDATORS).counts();
    detail.entomo_fungi_counts = count_shared_organisms(guild, &[Interaction::EntomopathogenicFungi]).counts();
    detail.herbivore_counts = count_shared_organisms(guild, &[Interaction::Herbivores]).counts();

    let raw = detail.biocontrol_raw / guild.len() as f64;
    Ok(MetricResult::normalized(MetricId::M3, raw, MetricDetail::M3(detail), guild, lookups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::PlantRecord;
    use crate::metrics::MetricScore;
    use crate::utils::normalization::{Calibration, PercentileParams};
    use crate::utils::organism_matcher::NameLookup;
    use approx::assert_relative_eq;

    const TIER: &str = "tier_3_humid_temperate";

    fn lookups() -> LookupTables {
        let calibration = Calibration::default().with_metric(TIER, MetricId::M3, PercentileParams::linear(0.0, 4.0));
        LookupTables::new(calibration, Default::default())
            .with_herbivore_predators(NameLookup::from_entries(vec![(
                "Aphis fabae",
                vec!["Coccinella septempunctata"],
            )]))
            .with_insect_parasites(NameLookup::from_entries(vec![("Aphis fabae", vec!["Beauveria bassiana"])]))
    }

    fn detail(result: &MetricResult) -> &M3Detail {
        match &result.detail {
            MetricDetail::M3(d) => d,
            _ => panic!("wrong detail"),
        }
    }

    #[test]
    fn weights_specific_and_general_links() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "Vicia faba").with_organisms(Interaction::Herbivores, ["aphis FABAE"]),
                PlantRecord::new("b", "Tanacetum vulgare")
                    .with_organisms(Interaction::PredatorsHasHost, ["Coccinella  septempunctata"])
                    .with_organisms(Interaction::EntomopathogenicFungi, ["Beauveria bassiana", "Lecanicillium lecanii"]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m3(&guild, &lookups()).unwrap();
        let d = detail(&result);
        assert_relative_eq!(d.biocontrol_raw, 1.0 + 1.0 + 0.2);
        assert_relative_eq!(result.raw, 2.2 / 2.0);
        assert_eq!(d.specific_predator_matches, 1);
        assert_eq!(d.specific_fungi_matches, 1);
        assert_eq!(d.general_fungi_matches, 1);
        assert_eq!(d.matched_pairs.len(), 2);
        assert!(d.matched_pairs.iter().any(|p| p.agent == "Coccinella  septempunctata"
            && p.target == "aphis FABAE"
            && p.mechanism == Mechanism::SpecificPredator));
        assert_relative_eq!(result.score.value().unwrap(), 27.5, epsilon = 1e-9);
    }

    #[test]
    fn same_plant_never_protects_itself() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A")
                    .with_organisms(Interaction::Herbivores, ["Aphis fabae"])
                    .with_organisms(Interaction::PredatorsHasHost, ["Coccinella septempunctata"]),
                PlantRecord::new("b", "B").with_organisms(Interaction::Herbivores, Vec::<String>::new()),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m3(&guild, &lookups()).unwrap();
        assert_eq!(result.raw, 0.0);
        assert!(result.score.is_available());
    }

    #[test]
    fn absent_herbivores_is_no_data() {
        let guild = Guild::new(
            vec![PlantRecord::new("a", "A").with_organisms(Interaction::PredatorsHasHost, ["Coccinella septempunctata"])],
            TIER,
        )
        .unwrap();
        let result = calculate_m3(&guild, &lookups()).unwrap();
        assert!(matches!(result.score, MetricScore::NoData { .. }));
    }

    #[test]
    fn counts_are_exhaustive() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A")
                    .with_organisms(Interaction::Herbivores, ["Aphis fabae"])
                    .with_organisms(Interaction::PredatorsAdjacentTo, ["Apis mellifera"]),
                PlantRecord::new("b", "B").with_organisms(Interaction::PredatorsInteractsWith, ["apis mellifera"]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m3(&guild, &lookups()).unwrap();
        assert_eq!(detail(&result).predator_counts.get("Apis mellifera"), Some(&2));
    }
}
