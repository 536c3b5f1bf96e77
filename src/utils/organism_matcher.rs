//! Case- and whitespace-insensitive organism name matching.
//!
//! Every comparison between a plant's organism list and a curated lookup
//! goes through `canonical_name`, so "Apis  Mellifera " and "apis mellifera"
//! are the same taxon everywhere.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Trim, collapse internal whitespace and lowercase. `None` for blank names.
pub fn canonical_name(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    for (i, part) in raw.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.extend(part.chars().flat_map(char::to_lowercase));
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

pub fn names_match(a: &str, b: &str) -> bool {
    match (canonical_name(a), canonical_name(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Set of canonical organism names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameSet {
    keys: FxHashSet<String>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raw: &str) -> bool {
        match canonical_name(raw) {
            Some(key) => self.keys.insert(key),
            None => false,
        }
    }

    pub fn contains(&self, raw: &str) -> bool {
        canonical_name(raw).map_or(false, |key| self.keys.contains(&key))
    }

    /// Membership test for a name that is already canonical.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn extend_from(&mut self, other: &NameSet) {
        self.keys.extend(other.keys.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = NameSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

/// Curated one-to-many lookup (threat -> known antagonists), canonical on both sides.
#[derive(Debug, Clone, Default)]
pub struct NameLookup {
    entries: FxHashMap<String, NameSet>,
}

impl NameLookup {
    pub fn from_entries<K, V, I>(entries: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = V>,
    {
        let mut map: FxHashMap<String, NameSet> = FxHashMap::default();
        for (key, values) in entries {
            let Some(key) = canonical_name(key.as_ref()) else {
                continue;
            };
            let set = map.entry(key).or_default();
            for v in values {
                set.insert(v.as_ref());
            }
        }
        Self { entries: map }
    }

    pub fn get(&self, raw_key: &str) -> Option<&NameSet> {
        canonical_name(raw_key).and_then(|k| self.entries.get(&k))
    }

    /// Union of every value set.
    pub fn all_values(&self) -> NameSet {
        let mut all = NameSet::new();
        for set in self.entries.values() {
            all.extend_from(set);
        }
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Names from `candidates` that belong to `set`, in input order.
pub fn find_matches<'a>(candidates: impl IntoIterator<Item = &'a str>, set: &NameSet) -> Vec<&'a str> {
    candidates.into_iter().filter(|c| set.contains(c)).collect()
}

/// (canonical key, original spelling) pairs, one per distinct key, sorted by key.
pub fn keyed_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<(String, &'a str)> {
    let mut keyed: Vec<(String, &str)> = names
        .into_iter()
        .filter_map(|n| canonical_name(n).map(|k| (k, n)))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    keyed
}
