//! Shared fixtures for integration tests.
#![allow(dead_code)]

use guild_network_scorer::metrics::PhyloPDCalculator;
use guild_network_scorer::utils::{NameLookup, PhyloTree};
use guild_network_scorer::{Calibration, GrowthForm, Guild, Interaction, LookupTables, MetricId, PercentileParams, PlantRecord};
use rustc_hash::FxHashMap;

pub const TIER: &str = "tier_3_humid_temperate";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Linear 0..hi calibration for every metric in `TIER`.
pub fn calibration() -> Calibration {
    MetricId::ALL.iter().fold(Calibration::default(), |cal, &id| {
        let hi = match id {
            MetricId::M3 | MetricId::M4 => 4.0,
            _ => 1.0,
        };
        cal.with_metric(TIER, id, PercentileParams::linear(0.0, hi))
    })
}

pub fn lookups() -> LookupTables {
    let tree = PhyloTree::parse("((oak:120,vine:150):200,(chive:80,(borage:40,phacelia:40):60):240);")
        .expect("fixture tree parses");
    let phylo = PhyloPDCalculator::new(tree, FxHashMap::default());
    LookupTables::new(calibration(), phylo)
        .with_herbivore_predators(NameLookup::from_entries(vec![(
            "Aphis fabae",
            vec!["Coccinella septempunctata", "Chrysoperla carnea"],
        )]))
        .with_insect_parasites(NameLookup::from_entries(vec![("Aphis fabae", vec!["Beauveria bassiana"])]))
        .with_pathogen_antagonists(NameLookup::from_entries(vec![(
            "Botrytis cinerea",
            vec!["Trichoderma harzianum"],
        )]))
}

pub fn oak() -> PlantRecord {
    PlantRecord::new("oak", "Quercus robur")
        .with_vernacular("English oak")
        .with_csr(55.0, 40.0, 5.0)
        .with_height(20.0)
        .with_growth_form(GrowthForm::Tree)
        .with_light(7.0)
        .with_organisms(Interaction::Herbivores, ["Tortrix viridana"])
        .with_organisms(Interaction::Pollinators, ["Bombus terrestris"])
        .with_organisms(Interaction::EmfFungi, ["Amanita muscaria"])
        .with_organisms(Interaction::AmfFungi, ["Glomus mosseae"])
}

pub fn vine() -> PlantRecord {
    PlantRecord::new("vine", "Vitis vinifera")
        .with_csr(45.0, 20.0, 35.0)
        .with_height(8.0)
        .with_growth_form(GrowthForm::VineLiana)
        .with_light(7.0)
        .with_organisms(Interaction::Herbivores, ["Aphis fabae"])
        .with_organisms(Interaction::Pollinators, ["Bombus terrestris", "Apis mellifera"])
        .with_organisms(Interaction::AmfFungi, ["glomus mosseae"])
        .with_organisms(Interaction::PathogenicFungi, ["Botrytis cinerea"])
}

pub fn chive() -> PlantRecord {
    PlantRecord::new("chive", "Allium schoenoprasum")
        .with_csr(20.0, 50.0, 30.0)
        .with_height(0.3)
        .with_growth_form(GrowthForm::Herb)
        .with_light(6.5)
        .with_organisms(Interaction::Herbivores, ["Delia antiqua"])
        .with_organisms(Interaction::Pollinators, ["Apis mellifera", "Eristalis tenax"])
        .with_organisms(Interaction::PredatorsHasHost, ["Coccinella septempunctata"])
        .with_organisms(Interaction::EntomopathogenicFungi, ["Beauveria bassiana"])
        .with_organisms(Interaction::MycoparasiteFungi, ["Trichoderma harzianum"])
        .with_organisms(Interaction::AmfFungi, ["Glomus mosseae"])
}

pub fn guild(plants: Vec<PlantRecord>) -> Guild {
    Guild::new(plants, TIER).expect("fixture guild is valid")
}

pub fn forest_garden() -> Guild {
    guild(vec![oak(), vine(), chive()])
}
