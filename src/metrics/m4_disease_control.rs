//! M4: Disease Suppression
//!
//! Same pairwise structure as M3 with fungal pathogens as the threat.
//! For vulnerable plant A and protective plant B:
//! - specific antagonist (mycoparasite or fungivore curated for one of A's pathogens): 1.0
//! - any other mycoparasite on B: 0.5
//! - any other fungivore on B: 0.2
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
pub struct M4Detail {
    pub pathogen_control_raw: f64,
    pub n_mechanisms: usize,
    pub mycoparasite_counts: BTreeMap<String, usize>,
    pub fungivore_counts: BTreeMap<String, usize>,
    pub pathogen_counts: BTreeMap<String, usize>,
    pub specific_antagonist_matches: usize,
    pub specific_fungivore_matches: usize,
    pub general_mycoparasite_matches: usize,
    pub general_fungivore_matches: usize,
    pub matched_pairs: Vec<MatchedPair>,
}

/// Calculate M4: Disease Suppression
pub fn calculate_m4(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    const AGENTS: [Interaction; 2] = [Interaction::MycoparasiteFungi, Interaction::Fungivores];

    if !guild.has_category_data(&[Interaction::PathogenicFungi]) {
        return Ok(MetricResult::no_data(
            MetricId::M4,
            "pathogenic fungi",
            MetricDetail::M4(M4Detail::default()),
        ));
    }
    if !guild.has_category_data(&AGENTS) {
        return Ok(MetricResult::no_data(
            MetricId::M4,
            "mycoparasites and fungivores",
            MetricDetail::M4(M4Detail::default()),
        ));
    }

    let plants = guild.plants();
    let pathogens: Vec<Vec<(String, &str)>> = plants
        .iter()
        .map(|p| keyed_names(p.organisms_in(&[Interaction::PathogenicFungi])))
        .collect();
    let mycoparasites: Vec<Vec<(String, &str)>> = plants
        .iter()
        .map(|p| keyed_names(p.organisms_in(&[Interaction::MycoparasiteFungi])))
        .collect();
    let fungivores: Vec<Vec<(String, &str)>> = plants
        .iter()
        .map(|p| keyed_names(p.organisms_in(&[Interaction::Fungivores])))
        .collect();

    let mut detail = M4Detail::default();
    let mut pairs = Vec::new();

    for (a, pathogens_a) in pathogens.iter().enumerate() {
        if pathogens_a.is_empty() {
            continue;
        }
        for b in 0..plants.len() {
            if a == b {
                continue;
            }

            let mut specific_myco: FxHashSet<&str> = FxHashSet::default();
            let mut specific_fungivore: FxHashSet<&str> = FxHashSet::default();

            for (_, pathogen) in pathogens_a {
                let Some(known) = lookups.pathogen_antagonists().get(pathogen) else {
                    continue;
                };
                for (key, agent) in &mycoparasites[b] {
                    if known.contains_key(key) {
                        detail.specific_antagonist_matches += 1;
                        specific_myco.insert(key.as_str());
                        pairs.push(MatchedPair {
                            target: pathogen.trim().to_string(),
                            agent: agent.trim().to_string(),
                            mechanism: Mechanism::SpecificMycoparasite,
                        });
                    }
                }
                for (key, agent) in &fungivores[b] {
                    if known.contains_key(key) {
                        detail.specific_fungivore_matches += 1;
                        specific_fungivore.insert(key.as_str());
                        pairs.push(MatchedPair {
                            target: pathogen.trim().to_string(),
                            agent: agent.trim().to_string(),
                            mechanism: Mechanism::SpecificFungivore,
                        });
                    }
                }
            }

            let general_myco = mycoparasites[b]
                .iter()
                .filter(|(k, _)| !specific_myco.contains(k.as_str()))
                .count();
            let general_fungivore = fungivores[b]
                .iter()
                .filter(|(k, _)| !specific_fungivore.contains(k.as_str()))
                .count();
            detail.general_mycoparasite_matches += general_myco;
            detail.general_fungivore_matches += general_fungivore;
        }
    }

    let specific = detail.specific_antagonist_matches + detail.specific_fungivore_matches;
    detail.pathogen_control_raw = specific as f64 * Mechanism::SpecificMycoparasite.weight()
        + detail.general_mycoparasite_matches as f64 * Mechanism::GeneralMycoparasite.weight()
        + detail.general_fungivore_matches as f64 * Mechanism::GeneralFungivore.weight();
    detail.n_mechanisms = specific + detail.general_mycoparasite_matches + detail.general_fungivore_matches;

    pairs.sort_unstable();
    pairs.dedup();
    detail.matched_pairs = pairs;
    detail.mycoparasite_counts = count_shared_organisms(guild, &[Interaction::MycoparasiteFungi]).counts();
    detail.fungivore_counts = count_shared_organisms(guild, &[Interaction::Fungivores]).counts();
    detail.pathogen_counts = count_shared_organisms(guild, &[Interaction::PathogenicFungi]).counts();

    let raw = detail.pathogen_control_raw / guild.len() as f64;
    Ok(MetricResult::normalized(MetricId::M4, raw, MetricDetail::M4(detail), guild, lookups))
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
        let calibration = Calibration::default().with_metric(TIER, MetricId::M4, PercentileParams::linear(0.0, 2.0));
        LookupTables::new(calibration, Default::default()).with_pathogen_antagonists(NameLookup::from_entries(vec![(
            "Botrytis cinerea",
            vec!["Trichoderma harzianum", "Folsomia candida"],
        )]))
    }

    fn detail(result: &MetricResult) -> &M4Detail {
        match &result.detail {
            MetricDetail::M4(d) => d,
            _ => panic!("wrong detail"),
        }
    }

    #[test]
    fn specific_and_general_weights() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "Fragaria vesca").with_organisms(Interaction::PathogenicFungi, ["Botrytis cinerea"]),
                PlantRecord::new("b", "Allium schoenoprasum")
                    .with_organisms(Interaction::MycoparasiteFungi, ["trichoderma HARZIANUM", "Ampelomyces quisqualis"])
                    .with_organisms(Interaction::Fungivores, ["Folsomia candida", "Orchesella cincta"]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m4(&guild, &lookups()).unwrap();
        let d = detail(&result);
        assert_eq!(d.specific_antagonist_matches, 1);
        assert_eq!(d.specific_fungivore_matches, 1);
        assert_eq!(d.general_mycoparasite_matches, 1);
        assert_eq!(d.general_fungivore_matches, 1);
        assert_relative_eq!(d.pathogen_control_raw, 1.0 + 1.0 + 0.5 + 0.2);
        assert_relative_eq!(result.raw, 2.7 / 2.0);
        assert_eq!(d.matched_pairs.len(), 2);
    }

    #[test]
    fn absent_agents_is_no_data() {
        let guild = Guild::new(
            vec![PlantRecord::new("a", "A").with_organisms(Interaction::PathogenicFungi, ["Botrytis cinerea"])],
            TIER,
        )
        .unwrap();
        let result = calculate_m4(&guild, &lookups()).unwrap();
        assert!(matches!(result.score, MetricScore::NoData { .. }));
    }

    #[test]
    fn empty_pathogen_lists_score_zero() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A").with_organisms(Interaction::PathogenicFungi, Vec::<String>::new()),
                PlantRecord::new("b", "B").with_organisms(Interaction::MycoparasiteFungi, ["Trichoderma harzianum"]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m4(&guild, &lookups()).unwrap();
        assert_eq!(result.raw, 0.0);
        assert_eq!(result.score, MetricScore::Scored(0.0));
    }
}
