//! M5: Beneficial Fungi Networks (mycorrhizae and endophytes)
//!
//! Scores common mycorrhizal networks and individual fungal associations.
//! Beneficial categories: AMF, EMF, endophytic, saprotrophic.
//!
//! - network = Σ plant_count / n over fungi shared by ≥ 2 plants
//! - coverage = plants with any beneficial fungus / n
//! - raw = 0.6 × network + 0.4 × coverage
//!
//! A fungus also listed as pathogenic still counts; it is only flagged as
//! dual-lifestyle in the category map.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::MetricError;
use crate::guild::{Guild, Interaction};
use crate::lookups::LookupTables;
use crate::metrics::{MetricDetail, MetricId, MetricResult};
use crate::utils::organism_counter::{count_shared_organisms, plants_with_any, OrganismTally};
use crate::utils::organism_matcher::NameSet;

const NETWORK_WEIGHT: f64 = 0.6;
const COVERAGE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FungusCategory {
    AMF,
    EMF,
    Endophytic,
    Saprotrophic,
}

impl FungusCategory {
    pub const ALL: [FungusCategory; 4] = [
        FungusCategory::AMF,
        FungusCategory::EMF,
        FungusCategory::Endophytic,
        FungusCategory::Saprotrophic,
    ];

    pub fn interaction(self) -> Interaction {
        match self {
            FungusCategory::AMF => Interaction::AmfFungi,
            FungusCategory::EMF => Interaction::EmfFungi,
            FungusCategory::Endophytic => Interaction::EndophyticFungi,
            FungusCategory::Saprotrophic => Interaction::SaprotrophicFungi,
        }
    }
}

impl std::fmt::Display for FungusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FungusCategory::AMF => write!(f, "AMF"),
            FungusCategory::EMF => write!(f, "EMF"),
            FungusCategory::Endophytic => write!(f, "Endophytic"),
            FungusCategory::Saprotrophic => write!(f, "Saprotrophic"),
        }
    }
}

/// Every beneficial category a fungus was listed under, plus the dual-lifestyle flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FungusClassification {
    pub categories: BTreeSet<FungusCategory>,
    /// Also listed as pathogenic on a guild plant.
    pub is_dual_lifestyle: bool,
    pub plant_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct M5Detail {
    pub network_score: f64,
    pub coverage_ratio: f64,
    pub n_shared_fungi: usize,
    pub plants_with_fungi: usize,
    /// Beneficial fungus -> plant count.
    pub fungi_counts: BTreeMap<String, usize>,
    pub classifications: BTreeMap<String, FungusClassification>,
}

/// Calculate M5: Beneficial Fungi Networks
pub fn calculate_m5(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    if !guild.has_category_data(&Interaction::BENEFICIAL_FUNGI) {
        return Ok(MetricResult::no_data(
            MetricId::M5,
            "beneficial fungi",
            MetricDetail::M5(M5Detail::default()),
        ));
    }

    let n = guild.len() as f64;
    let tally = count_shared_organisms(guild, &Interaction::BENEFICIAL_FUNGI);

    let network_score: f64 = tally.shared(2).map(|e| e.plant_count() as f64 / n).sum();
    let plants_with_fungi = plants_with_any(guild, &Interaction::BENEFICIAL_FUNGI);
    let coverage_ratio = plants_with_fungi as f64 / n;
    let raw = NETWORK_WEIGHT * network_score + COVERAGE_WEIGHT * coverage_ratio;

    let detail = M5Detail {
        network_score,
        coverage_ratio,
        n_shared_fungi: tally.shared(2).count(),
        plants_with_fungi,
        fungi_counts: tally.counts(),
        classifications: classify_fungi(guild, &tally),
    };

    Ok(MetricResult::normalized(MetricId::M5, raw, MetricDetail::M5(detail), guild, lookups))
}

/// Additive category map keyed by display name.
fn classify_fungi(guild: &Guild, tally: &OrganismTally) -> BTreeMap<String, FungusClassification> {
    let pathogens: NameSet = guild
        .plants()
        .iter()
        .flat_map(|p| p.organisms_of(Interaction::PathogenicFungi))
        .collect();
    let by_category: Vec<(FungusCategory, NameSet)> = FungusCategory::ALL
        .into_iter()
        .map(|cat| {
            let names: NameSet = guild
                .plants()
                .iter()
                .flat_map(|p| p.organisms_of(cat.interaction()))
                .collect();
            (cat, names)
        })
        .collect();

    tally
        .iter()
        .map(|(key, entry)| {
            let classification = FungusClassification {
                categories: by_category
                    .iter()
                    .filter(|(_, names)| names.contains_key(key))
                    .map(|(cat, _)| *cat)
                    .collect(),
                is_dual_lifestyle: pathogens.contains_key(key),
                plant_count: entry.plant_count(),
            };
            (entry.display_name.clone(), classification)
        })
        .collect()
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
        let calibration = Calibration::default().with_metric(TIER, MetricId::M5, PercentileParams::linear(0.0, 2.0));
        LookupTables::new(calibration, Default::default())
    }

    fn detail(result: &MetricResult) -> &M5Detail {
        match &result.detail {
            MetricDetail::M5(d) => d,
            _ => panic!("wrong detail"),
        }
    }

    fn guild(extra_pathogen: bool) -> Guild {
        let mut a = PlantRecord::new("a", "A")
            .with_organisms(Interaction::AmfFungi, ["Glomus mosseae"])
            .with_organisms(Interaction::SaprotrophicFungi, ["Fusarium oxysporum"]);
        if extra_pathogen {
            a = a.with_organisms(Interaction::PathogenicFungi, ["fusarium  oxysporum"]);
        }
        Guild::new(
            vec![
                a,
                PlantRecord::new("b", "B")
                    .with_organisms(Interaction::AmfFungi, ["glomus mosseae"])
                    .with_organisms(Interaction::EndophyticFungi, ["Glomus mosseae"]),
                PlantRecord::new("c", "C").with_organisms(Interaction::EmfFungi, Vec::<String>::new()),
            ],
            TIER,
        )
        .unwrap()
    }

    #[test]
    fn network_and_coverage() {
        let result = calculate_m5(&guild(false), &lookups()).unwrap();
        let d = detail(&result);
        assert_relative_eq!(d.network_score, 2.0 / 3.0);
        assert_relative_eq!(d.coverage_ratio, 2.0 / 3.0);
        assert_relative_eq!(result.raw, 0.6 * 2.0 / 3.0 + 0.4 * 2.0 / 3.0);
        assert_eq!(d.n_shared_fungi, 1);
    }

    #[test]
    fn dual_lifestyle_flags_without_changing_score() {
        let plain = calculate_m5(&guild(false), &lookups()).unwrap();
        let dual = calculate_m5(&guild(true), &lookups()).unwrap();
        assert_eq!(plain.raw, dual.raw);
        let fusarium = &detail(&dual).classifications["Fusarium oxysporum"];
        assert!(fusarium.is_dual_lifestyle);
        assert!(!detail(&plain).classifications["Fusarium oxysporum"].is_dual_lifestyle);
    }

    #[test]
    fn categories_are_additive() {
        let result = calculate_m5(&guild(false), &lookups()).unwrap();
        let glomus = &detail(&result).classifications["Glomus mosseae"];
        assert!(glomus.categories.contains(&FungusCategory::AMF));
        assert!(glomus.categories.contains(&FungusCategory::Endophytic));
    }

    #[test]
    fn fungus_on_every_plant_contributes_one() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("a", "A").with_organisms(Interaction::AmfFungi, ["Glomus mosseae"]),
                PlantRecord::new("b", "B").with_organisms(Interaction::AmfFungi, ["Glomus mosseae"]),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m5(&guild, &lookups()).unwrap();
        assert_relative_eq!(detail(&result).network_score, 1.0);
    }

    #[test]
    fn fungus_on_no_plant_changes_nothing() {
        use crate::utils::organism_matcher::NameLookup;

        let base = calculate_m5(&guild(false), &lookups()).unwrap();

        // Known to the lookups and listed only as a pathogen or mycoparasite
        let lookups = lookups().with_pathogen_antagonists(NameLookup::from_entries(vec![(
            "Botrytis cinerea",
            vec!["Trichoderma harzianum"],
        )]));
        let mut plants = guild(false).plants().to_vec();
        plants[2] = plants[2]
            .clone()
            .with_organisms(Interaction::PathogenicFungi, ["Botrytis cinerea"])
            .with_organisms(Interaction::MycoparasiteFungi, ["Trichoderma harzianum"]);
        let padded = Guild::new(plants, TIER).unwrap();
        let result = calculate_m5(&padded, &lookups).unwrap();

        assert_eq!(result.raw, base.raw);
        assert_eq!(result.score, base.score);
        assert_eq!(detail(&result).fungi_counts, detail(&base).fungi_counts);
        assert!(!detail(&result).classifications.contains_key("Botrytis cinerea"));
    }

    #[test]
    fn absent_columns_are_no_data() {
        let guild = Guild::new(vec![PlantRecord::new("a", "A")], TIER).unwrap();
        let result = calculate_m5(&guild, &lookups()).unwrap();
        assert!(matches!(result.score, MetricScore::NoData { .. }));
    }
}
