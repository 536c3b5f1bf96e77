//! Unified Taxonomic Categorization
//!
//! One categorization system for herbivores, predators and pollinators.
//! A curated genus -> category table wins; otherwise the genus is looked up
//! in built-in pattern tables, and finally the role decides the fallback.
//!
//! Functional categories are preferred over pure taxonomy for clarity to
//! gardeners.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Organism role context for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganismRole {
    Herbivore,
    Predator,
    Pollinator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrganismCategory {
    // Appear in several roles
    Bumblebees,
    HoneyBees,
    SolitaryBees,
    Hoverflies,
    Butterflies,
    Moths,
    Wasps,
    ParasitoidWasps,
    Ants,
    Flies,
    Beetles,

    // Herbivores
    Aphids,
    ScaleInsects,
    Mites,
    LeafMiners,
    Caterpillars,
    Thrips,
    Whiteflies,
    Leafhoppers,
    Weevils,
    LeafBeetles,
    Psyllids,
    TrueBugs,
    Sawflies,
    Grasshoppers,
    Snails,

    // Predators
    Spiders,
    GroundBeetles,
    RoveBeetles,
    Ladybugs,
    PredatoryBugs,
    Lacewings,
    Harvestmen,
    Earwigs,
    Bats,
    Birds,
    Amphibians,
    Reptiles,

    OtherHerbivores,
    OtherPredators,
    OtherPollinators,
    Other,
}

use OrganismCategory as C;

/// Labels used by the curated genus table.
const CURATED_LABELS: &[(&str, OrganismCategory)] = &[
    ("Ants", C::Ants),
    ("Aphids", C::Aphids),
    ("Bats", C::Bats),
    ("Bees", C::SolitaryBees),
    ("Beetles", C::Beetles),
    ("Birds", C::Birds),
    ("Bugs", C::TrueBugs),
    ("Butterflies", C::Butterflies),
    ("Earwigs", C::Earwigs),
    ("Flies", C::Flies),
    ("Frogs", C::Amphibians),
    ("Grasshoppers", C::Grasshoppers),
    ("Crickets", C::Grasshoppers),
    ("Lacewings", C::Lacewings),
    ("Leafhoppers", C::Leafhoppers),
    ("Lizards", C::Reptiles),
    ("Mites", C::Mites),
    ("Moths", C::Moths),
    ("Psyllids", C::Psyllids),
    ("Salamanders", C::Amphibians),
    ("Sawflies", C::Sawflies),
    ("Scales", C::ScaleInsects),
    ("Snails", C::Snails),
    ("Snakes", C::Reptiles),
    ("Spiders", C::Spiders),
    ("Thrips", C::Thrips),
    ("Wasps", C::Wasps),
    ("Whiteflies", C::Whiteflies),
];

/// Built-in genus tables, checked in order.
const GENUS_PATTERNS: &[(OrganismCategory, &[&str])] = &[
    (C::Bumblebees, &["bombus"]),
    (C::HoneyBees, &["apis"]),
    (
        C::SolitaryBees,
        &[
            "andrena", "lasioglossum", "halictus", "osmia", "megachile", "ceratina", "hylaeus", "colletes",
            "eucera", "anthophora", "xylocopa", "nomada", "sphecodes", "panurgus", "dasypoda", "melitta",
        ],
    ),
    (
        C::Hoverflies,
        &[
            "syrphus", "platycheirus", "episyrphus", "eupeodes", "sphaerophoria", "melanostoma", "eristalis",
            "cheilosia", "helophilus", "syritta", "volucella", "rhingia", "scaeva", "myathropa",
        ],
    ),
    (
        C::Butterflies,
        &[
            "papilio", "pieris", "vanessa", "danaus", "colias", "lycaena", "polyommatus", "anthocharis",
            "gonepteryx", "aglais", "argynnis", "maniola", "pararge", "pyronia", "thymelicus", "celastrina",
        ],
    ),
    (
        C::Moths,
        &[
            "orgyia", "acronicta", "spodoptera", "lymantria", "malacosoma", "biston", "operophtera", "erannis",
            "agriopis", "archips", "choristoneura", "tortrix", "pandemis", "hedya", "amphipyra", "autographa",
            "zygaena", "tyria",
        ],
    ),
    (C::Wasps, &["vespula", "vespa", "polistes", "ammophila", "crabro", "cerceris", "ectemnius"]),
    (
        C::ParasitoidWasps,
        &["aleiodes", "ichneumon", "ophion", "diadegma", "cotesia", "apanteles", "trichogramma", "encarsia", "aphidius", "praon"],
    ),
    (C::Ants, &["formica", "lasius", "camponotus", "myrmica", "tetramorium", "solenopsis", "tapinoma"]),
    (C::Flies, &["empis", "sarcophaga", "lucilia", "pollenia", "calliphora", "bombylius", "scathophaga"]),
    (
        C::Aphids,
        &[
            "aphis", "myzus", "macrosiphum", "aulacorthum", "uroleucon", "brachycaudus", "dysaphis",
            "rhopalosiphum", "sitobion", "acyrthosiphon", "cavariella", "nasonovia",
        ],
    ),
    (C::ScaleInsects, &["coccus", "saissetia", "lepidosaphes", "aspidiotus", "aonidiella", "parlatoria"]),
    (C::Mites, &["aceria", "tetranychus", "eriophyes", "panonychus", "oligonychus", "bryobia", "brevipalpus"]),
    (C::LeafMiners, &["phytomyza", "liriomyza", "agromyza", "chromatomyia", "stigmella", "phyllonorycter"]),
    (C::Thrips, &["thrips", "frankliniella"]),
    (C::Whiteflies, &["bemisia", "trialeurodes", "aleyrodes", "aleurocanthus"]),
    (C::Leafhoppers, &["empoasca", "graphocephala", "erythroneura", "typhlocyba", "eupteryx", "cicadella"]),
    (C::Weevils, &["curculio", "anthonomus", "phyllobius", "otiorhynchus", "sitona", "hypera", "ceutorhynchus"]),
    (
        C::LeafBeetles,
        &["chrysomela", "phyllotreta", "cassida", "altica", "longitarsus", "psylliodes", "galerucella", "leptinotarsa"],
    ),
    (C::Psyllids, &["psylla", "cacopsylla", "trioza", "psyllopsis"]),
    (C::TrueBugs, &["lygus", "nezara", "eurygaster", "dolycoris", "palomena", "halyomorpha", "lygocoris"]),
    (C::Sawflies, &["tenthredo", "nematus", "athalia", "caliroa", "pristiphora"]),
    (C::Snails, &["helix", "cepaea", "cornu", "arion", "deroceras", "limax"]),
    (
        C::Spiders,
        &["xysticus", "araniella", "tetragnatha", "pardosa", "pisaura", "araneus", "agelena", "salticus", "tibellus"],
    ),
    (
        C::GroundBeetles,
        &["amara", "pterostichus", "carabus", "harpalus", "calathus", "nebria", "poecilus", "bembidion", "cicindela"],
    ),
    (C::RoveBeetles, &["philonthus", "ocypus", "tachyporus", "staphylinus", "paederus", "stenus", "aleochara"]),
    (
        C::Ladybugs,
        &["adalia", "hippodamia", "coccinella", "harmonia", "chilocorus", "scymnus", "propylea", "calvia"],
    ),
    (C::PredatoryBugs, &["nabis", "anthocoris", "orius", "deraeocoris", "zelus", "podisus"]),
    (C::Lacewings, &["chrysoperla", "chrysopa", "hemerobius", "micromus"]),
    (C::Harvestmen, &["opilio", "phalangium", "leiobunum"]),
    (C::Earwigs, &["forficula", "labidura"]),
    (C::Bats, &["myotis", "rhinolophus", "eptesicus", "nyctalus", "pipistrellus", "plecotus", "lasiurus"]),
    (
        C::Birds,
        &["turdus", "parus", "cyanistes", "fringilla", "sturnus", "erithacus", "phylloscopus", "trochilus", "calypte", "archilochus"],
    ),
];

impl OrganismCategory {
    /// Categorize an organism by functional guild.
    ///
    /// `curated` maps lowercase genus -> curated label ("Bees", "Aphids", ...).
    pub fn from_name(name: &str, curated: &FxHashMap<String, String>, role: Option<OrganismRole>) -> Self {
        let name_lower = name.trim().to_lowercase();
        let genus = name_lower.split_whitespace().next().unwrap_or("");

        if let Some(label) = curated.get(genus) {
            if let Some(category) = Self::from_curated_label(label, genus) {
                return category;
            }
        }

        if let Some((category, _)) = GENUS_PATTERNS.iter().find(|(_, genera)| genera.contains(&genus)) {
            return *category;
        }

        if role == Some(OrganismRole::Herbivore) && (name_lower.contains("larva") || name_lower.contains("caterpillar")) {
            return C::Caterpillars;
        }

        match role {
            Some(OrganismRole::Herbivore) => C::OtherHerbivores,
            Some(OrganismRole::Predator) => C::OtherPredators,
            Some(OrganismRole::Pollinator) => C::OtherPollinators,
            None => C::Other,
        }
    }

    fn from_curated_label(label: &str, genus: &str) -> Option<Self> {
        let (_, category) = CURATED_LABELS.iter().find(|(l, _)| l.eq_ignore_ascii_case(label.trim()))?;
        // Refine bees and flies where the genus allows it
        let refined = match category {
            C::SolitaryBees if genus == "bombus" => C::Bumblebees,
            C::SolitaryBees if genus == "apis" => C::HoneyBees,
            C::Flies if genus.contains("syrph") => C::Hoverflies,
            other => *other,
        };
        Some(refined)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            C::Bumblebees => "Bumblebees",
            C::HoneyBees => "Honey Bees",
            C::SolitaryBees => "Solitary Bees",
            C::Hoverflies => "Hoverflies",
            C::Butterflies => "Butterflies",
            C::Moths => "Moths",
            C::Wasps => "Wasps",
            C::ParasitoidWasps => "Parasitoid Wasps",
            C::Ants => "Ants",
            C::Flies => "Flies",
            C::Beetles => "Beetles",
            C::Aphids => "Aphids",
            C::ScaleInsects => "Scale Insects",
            C::Mites => "Mites",
            C::LeafMiners => "Leaf Miners",
            C::Caterpillars => "Caterpillars",
            C::Thrips => "Thrips",
            C::Whiteflies => "Whiteflies",
            C::Leafhoppers => "Leafhoppers",
            C::Weevils => "Weevils",
            C::LeafBeetles => "Leaf Beetles",
            C::Psyllids => "Psyllids",
            C::TrueBugs => "True Bugs",
            C::Sawflies => "Sawflies",
            C::Grasshoppers => "Grasshoppers & Crickets",
            C::Snails => "Snails & Slugs",
            C::Spiders => "Spiders",
            C::GroundBeetles => "Ground Beetles",
            C::RoveBeetles => "Rove Beetles",
            C::Ladybugs => "Ladybugs",
            C::PredatoryBugs => "Predatory Bugs",
            C::Lacewings => "Lacewings",
            C::Harvestmen => "Harvestmen",
            C::Earwigs => "Earwigs",
            C::Bats => "Bats",
            C::Birds => "Birds",
            C::Amphibians => "Amphibians",
            C::Reptiles => "Reptiles",
            C::OtherHerbivores => "Other Herbivores",
            C::OtherPredators => "Other Predators",
            C::OtherPollinators => "Other Pollinators",
            C::Other => "Other",
        }
    }
}

impl fmt::Display for OrganismCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Coarse pollinator groups shown in the pollinator network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PollinatorCategory {
    Bees,
    Butterflies,
    Moths,
    Flies,
    Beetles,
    Wasps,
    Birds,
    Bats,
    Other,
}

impl PollinatorCategory {
    pub fn from_name(name: &str, curated: &FxHashMap<String, String>) -> Self {
        Self::from(OrganismCategory::from_name(name, curated, Some(OrganismRole::Pollinator)))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PollinatorCategory::Bees => "Bees",
            PollinatorCategory::Butterflies => "Butterflies",
            PollinatorCategory::Moths => "Moths",
            PollinatorCategory::Flies => "Flies",
            PollinatorCategory::Beetles => "Beetles",
            PollinatorCategory::Wasps => "Wasps",
            PollinatorCategory::Birds => "Birds",
            PollinatorCategory::Bats => "Bats",
            PollinatorCategory::Other => "Other",
        }
    }
}

impl From<OrganismCategory> for PollinatorCategory {
    fn from(category: OrganismCategory) -> Self {
        match category {
            C::Bumblebees | C::HoneyBees | C::SolitaryBees => PollinatorCategory::Bees,
            C::Butterflies => PollinatorCategory::Butterflies,
            C::Moths => PollinatorCategory::Moths,
            C::Hoverflies | C::Flies => PollinatorCategory::Flies,
            C::Beetles | C::GroundBeetles | C::RoveBeetles | C::Ladybugs | C::LeafBeetles | C::Weevils => {
                PollinatorCategory::Beetles
            }
            C::Wasps | C::ParasitoidWasps | C::Sawflies => PollinatorCategory::Wasps,
            C::Birds => PollinatorCategory::Birds,
            C::Bats => PollinatorCategory::Bats,
            _ => PollinatorCategory::Other,
        }
    }
}
