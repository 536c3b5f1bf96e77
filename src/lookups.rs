//! Curated, read-only lookup tables shared by every scoring call.
//!
//! Built once per process and passed by reference (or behind an `Arc`) to
//! metrics and analyzers. Nothing here is mutated after construction.

use rustc_hash::FxHashMap;

use crate::metrics::PhyloPDCalculator;
use crate::utils::normalization::{Calibration, CsrCalibration};
use crate::utils::organism_matcher::{canonical_name, NameLookup, NameSet};

#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    herbivore_predators: NameLookup,
    insect_parasites: NameLookup,
    pathogen_antagonists: NameLookup,
    known_predators: NameSet,
    known_entomopathogens: NameSet,
    known_antagonists: NameSet,
    /// Lowercase genus -> functional category label.
    organism_categories: FxHashMap<String, String>,
    calibration: Calibration,
    csr_calibration: Option<CsrCalibration>,
    phylo: PhyloPDCalculator,
}

impl LookupTables {
    pub fn new(calibration: Calibration, phylo: PhyloPDCalculator) -> Self {
        Self {
            calibration,
            phylo,
            ..Default::default()
        }
    }

    /// Herbivore -> known predators.
    pub fn with_herbivore_predators(mut self, lookup: NameLookup) -> Self {
        self.known_predators = lookup.all_values();
        self.herbivore_predators = lookup;
        self
    }

    /// Herbivore -> known entomopathogenic fungi.
    pub fn with_insect_parasites(mut self, lookup: NameLookup) -> Self {
        self.known_entomopathogens = lookup.all_values();
        self.insect_parasites = lookup;
        self
    }

    /// Pathogen -> known mycoparasites and fungivores.
    pub fn with_pathogen_antagonists(mut self, lookup: NameLookup) -> Self {
        self.known_antagonists = lookup.all_values();
        self.pathogen_antagonists = lookup;
        self
    }

    pub fn with_organism_categories<K: AsRef<str>, V: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.organism_categories = entries
            .into_iter()
            .filter_map(|(genus, label)| canonical_name(genus.as_ref()).map(|g| (g, label.into())))
            .collect();
        self
    }

    pub fn with_csr_calibration(mut self, csr: CsrCalibration) -> Self {
        self.csr_calibration = Some(csr);
        self
    }

    pub fn herbivore_predators(&self) -> &NameLookup {
        &self.herbivore_predators
    }

    pub fn insect_parasites(&self) -> &NameLookup {
        &self.insect_parasites
    }

    pub fn pathogen_antagonists(&self) -> &NameLookup {
        &self.pathogen_antagonists
    }

    /// Every predator named anywhere in the herbivore table.
    pub fn known_predators(&self) -> &NameSet {
        &self.known_predators
    }

    pub fn known_entomopathogens(&self) -> &NameSet {
        &self.known_entomopathogens
    }

    pub fn known_antagonists(&self) -> &NameSet {
        &self.known_antagonists
    }

    pub fn organism_categories(&self) -> &FxHashMap<String, String> {
        &self.organism_categories
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn csr_calibration(&self) -> Option<&CsrCalibration> {
        self.csr_calibration.as_ref()
    }

    pub fn phylo(&self) -> &PhyloPDCalculator {
        &self.phylo
    }
}
