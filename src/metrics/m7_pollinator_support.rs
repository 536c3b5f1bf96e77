//! M7: Pollinator Support (shared pollinators)
//!
//! Quadratic weighting rewards pollinators that visit many guild plants:
//! each pollinator shared by at least two plants contributes
//! `(plant_count / n)²`, and the sum is divided by `n`.
//!
//! Uses only the strict `pollinators` list. Any pollinator that also appears
//! in a guild plant's herbivore list is dropped before counting.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::MetricError;
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::metrics::{MetricDetail, MetricId, MetricResult};
use crate::utils::organism_counter::{count_shared_organisms, OrganismTally};
use crate::utils::organism_matcher::NameSet;

#[derive(Debug, Clone, Default, Serialize)]
pub struct M7Detail {
    /// Sum of squared sharing ratios before dividing by guild size.
    pub quadratic_score: f64,
    pub n_shared_pollinators: usize,
    pub plants_with_pollinators: usize,
    pub total_plants: usize,
    /// Pollinator -> plant count, pests already removed.
    pub pollinator_counts: BTreeMap<String, usize>,
    /// Pollinators dropped because a guild plant lists them as herbivores.
    pub excluded_pests: Vec<String>,
}

/// Calculate M7: Pollinator Support
pub fn calculate_m7(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    if !guild.has_category_data(&[Interaction::Pollinators]) {
        return Ok(MetricResult::no_data(
            MetricId::M7,
            "pollinators",
            MetricDetail::M7(M7Detail::default()),
        ));
    }

    let n = guild.len() as f64;
    let (tally, excluded_pests) = pollinator_tally(guild);

    let quadratic_score: f64 = tally
        .shared(2)
        .map(|e| {
            let ratio = e.plant_count() as f64 / n;
            ratio * ratio
        })
        .sum();

    let mut hosts: Vec<usize> = tally.iter().flat_map(|(_, e)| e.plants.iter().copied()).collect();
    hosts.sort_unstable();
    hosts.dedup();

    let detail = M7Detail {
        quadratic_score,
        n_shared_pollinators: tally.shared(2).count(),
        plants_with_pollinators: hosts.len(),
        total_plants: guild.len(),
        pollinator_counts: tally.counts(),
        excluded_pests,
    };

    let raw = quadratic_score / n;
    Ok(MetricResult::normalized(MetricId::M7, raw, MetricDetail::M7(detail), guild, lookups))
}

/// Pollinator tally with pests removed, plus the sorted display names removed.
pub(crate) fn pollinator_tally(guild: &Guild) -> (OrganismTally, Vec<String>) {
    let herbivores: NameSet = guild
        .plants()
        .iter()
        .flat_map(|p| p.organisms_of(Interaction::Herbivores))
        .collect();

    let mut tally = count_shared_organisms(guild, &[Interaction::Pollinators]);
    let mut excluded: Vec<String> = tally
        .iter()
        .filter(|(key, _)| herbivores.contains_key(key))
        .map(|(_, e)| e.display_name.clone())
        .collect();
    excluded.sort();
    tally.retain(|key| !herbivores.contains_key(key));

    (tally, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::PlantRecord;
    use crate::metrics::MetricScore;
    use crate::utils::normalization::{Calibration, PercentileParams};
    use approx::assert_relative_eq;

    const TIER: &str = "tier_3_humid_temperate";

    fn lookups() -> LookupTables {
        let calibration = Calibration::default().with_metric(TIER, MetricId::M7, PercentileParams::linear(0.0, 1.0));
        LookupTables::new(calibration, Default::default())
    }

    fn detail(result: &MetricResult) -> &M7Detail {
        match &result.detail {
            MetricDetail::M7(d) => d,
            _ => panic!("wrong detail"),
        }
    }

    #[test]
    fn one_pollinator_on_both_plants() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "PlantA").with_organisms(Interaction::Pollinators, ["Bombus terrestris"]),
                PlantRecord::new("b", "PlantB").with_organisms(Interaction::Pollinators, ["bombus terrestris "]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m7(&guild, &lookups()).unwrap();
        assert_relative_eq!(detail(&result).quadratic_score, 1.0);
        assert_relative_eq!(result.raw, 0.5);
        assert_eq!(detail(&result).n_shared_pollinators, 1);
    }

    #[test]
    fn single_plant_pollinators_contribute_nothing() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A").with_organisms(Interaction::Pollinators, ["Apis mellifera"]),
                PlantRecord::new("b", "B").with_organisms(Interaction::Pollinators, ["Eristalis tenax"]),
                PlantRecord::new("c", "C").with_organisms(Interaction::Pollinators, Vec::<String>::new()),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m7(&guild, &lookups()).unwrap();
        assert_eq!(result.raw, 0.0);
        assert_eq!(detail(&result).plants_with_pollinators, 2);
        assert_eq!(detail(&result).total_plants, 3);
    }

    #[test]
    fn pests_are_excluded() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A")
                    .with_organisms(Interaction::Pollinators, ["Apis mellifera", "Pieris rapae"])
                    .with_organisms(Interaction::Herbivores, ["Pieris rapae"]),
                PlantRecord::new("b", "B").with_organisms(Interaction::Pollinators, ["Apis mellifera", "Pieris rapae"]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m7(&guild, &lookups()).unwrap();
        let d = detail(&result);
        assert_eq!(d.excluded_pests, vec!["Pieris rapae".to_string()]);
        assert_eq!(d.n_shared_pollinators, 1);
        assert_relative_eq!(result.raw, 0.5);
    }

    #[test]
    fn absent_pollinators_is_no_data() {
        let guild = Guild::new(vec![PlantRecord::new("a", "A")], TIER).unwrap();
        let result = calculate_m7(&guild, &lookups()).unwrap();
        assert!(matches!(result.score, MetricScore::NoData { .. }));
    }
}
