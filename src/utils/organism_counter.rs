//! Shared organism counter.
//!
//! Counts how many guild plants host each organism, keyed by canonical name.
//! Used by M5, M7 and the network analyzers.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::guild::{Guild, Interaction};
use crate::utils::organism_matcher::canonical_name;

#[derive(Debug, Clone, PartialEq)]
pub struct TallyEntry {
    /// First spelling seen in guild order.
    pub display_name: String,
    /// Guild indices of host plants, ascending.
    pub plants: Vec<usize>,
}

impl TallyEntry {
    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrganismTally {
    entries: FxHashMap<String, TallyEntry>,
}

impl OrganismTally {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, raw_name: &str) -> Option<&TallyEntry> {
        canonical_name(raw_name).and_then(|k| self.entries.get(&k))
    }

    /// (canonical key, entry) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TallyEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries hosted by at least `min_plants` plants.
    pub fn shared(&self, min_plants: usize) -> impl Iterator<Item = &TallyEntry> {
        self.entries.values().filter(move |e| e.plants.len() >= min_plants)
    }

    /// Display name -> plant count, ordered by name.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.entries
            .values()
            .map(|e| (e.display_name.clone(), e.plants.len()))
            .collect()
    }

    /// Drop every organism whose canonical key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|k, _| keep(k));
    }

    fn record(&mut self, key: String, display: &str, plant_idx: usize) {
        let entry = self.entries.entry(key).or_insert_with(|| TallyEntry {
            display_name: display.trim().to_string(),
            plants: Vec::new(),
        });
        if entry.plants.last() != Some(&plant_idx) {
            entry.plants.push(plant_idx);
        }
    }
}

/// Count organisms shared across guild plants.
///
/// Lists from all `categories` are merged per plant and deduplicated by
/// canonical name before counting, so an organism listed twice for the same
/// plant (or in two categories) counts once for that plant.
pub fn count_shared_organisms(guild: &Guild, categories: &[Interaction]) -> OrganismTally {
    let mut tally = OrganismTally::default();

    for (idx, plant) in guild.plants().iter().enumerate() {
        // Most plants have < 16 organisms per category group
        let mut plant_organisms: SmallVec<[(String, &str); 16]> = SmallVec::new();
        for name in plant.organisms_in(categories) {
            if let Some(key) = canonical_name(name) {
                plant_organisms.push((key, name));
            }
        }
        plant_organisms.sort_by(|a, b| a.0.cmp(&b.0));
        plant_organisms.dedup_by(|a, b| a.0 == b.0);

        for (key, display) in plant_organisms {
            tally.record(key, display, idx);
        }
    }

    tally
}

/// Number of plants with at least one organism across `categories`.
pub fn plants_with_any(guild: &Guild, categories: &[Interaction]) -> usize {
    guild
        .plants()
        .iter()
        .filter(|p| p.organisms_in(categories).any(|n| !n.trim().is_empty()))
        .count()
}
