//! Typed guild records.
//!
//! Every organism list is an `Option<BTreeSet<String>>`: `None` means the
//! source table had no such column for the plant, `Some(empty)` means the
//! column was present and listed nothing. The two states stay distinct all
//! the way into the metrics and analyzers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::GuildError;

/// Organism and fungus categories attached to a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interaction {
    Herbivores,
    Pollinators,
    PredatorsHasHost,
    PredatorsInteractsWith,
    PredatorsAdjacentTo,
    Fungivores,
    AmfFungi,
    EmfFungi,
    EndophyticFungi,
    SaprotrophicFungi,
    PathogenicFungi,
    MycoparasiteFungi,
    EntomopathogenicFungi,
}

impl Interaction {
    pub const ORGANISMS: [Interaction; 6] = [
        Interaction::Herbivores,
        Interaction::Pollinators,
        Interaction::PredatorsHasHost,
        Interaction::PredatorsInteractsWith,
        Interaction::PredatorsAdjacentTo,
        Interaction::Fungivores,
    ];

    pub const FUNGI: [Interaction; 7] = [
        Interaction::AmfFungi,
        Interaction::EmfFungi,
        Interaction::EndophyticFungi,
        Interaction::SaprotrophicFungi,
        Interaction::PathogenicFungi,
        Interaction::MycoparasiteFungi,
        Interaction::EntomopathogenicFungi,
    ];

    pub const PREDATORS: [Interaction; 3] = [
        Interaction::PredatorsHasHost,
        Interaction::PredatorsInteractsWith,
        Interaction::PredatorsAdjacentTo,
    ];

    pub const BENEFICIAL_FUNGI: [Interaction; 4] = [
        Interaction::AmfFungi,
        Interaction::EmfFungi,
        Interaction::EndophyticFungi,
        Interaction::SaprotrophicFungi,
    ];

    /// Column name in the organism/fungi tables.
    pub fn column_name(self) -> &'static str {
        match self {
            Interaction::Herbivores => "herbivores",
            Interaction::Pollinators => "pollinators",
            Interaction::PredatorsHasHost => "predators_hasHost",
            Interaction::PredatorsInteractsWith => "predators_interactsWith",
            Interaction::PredatorsAdjacentTo => "predators_adjacentTo",
            Interaction::Fungivores => "fungivores_eats",
            Interaction::AmfFungi => "amf_fungi",
            Interaction::EmfFungi => "emf_fungi",
            Interaction::EndophyticFungi => "endophytic_fungi",
            Interaction::SaprotrophicFungi => "saprotrophic_fungi",
            Interaction::PathogenicFungi => "pathogenic_fungi",
            Interaction::MycoparasiteFungi => "mycoparasite_fungi",
            Interaction::EntomopathogenicFungi => "entomopathogenic_fungi",
        }
    }
}

/// Coarse growth form used for vertical-niche reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrowthForm {
    Tree,
    Shrub,
    Herb,
    VineLiana,
    Graminoid,
    Other,
}

impl GrowthForm {
    /// Number of distinct forms, used to scale form diversity.
    pub const COUNT: usize = 6;

    /// Classify a free-text growth-form label ("tree", "shrub/tree", "liana", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }
        let form = if label.contains("vine") || label.contains("liana") || label.contains("climber") {
            GrowthForm::VineLiana
        } else if label.contains("tree") {
            GrowthForm::Tree
        } else if label.contains("shrub") {
            GrowthForm::Shrub
        } else if label.contains("gramin") || label.contains("grass") {
            GrowthForm::Graminoid
        } else if label.contains("herb") || label.contains("forb") {
            GrowthForm::Herb
        } else {
            GrowthForm::Other
        };
        Some(form)
    }

    pub fn label(self) -> &'static str {
        match self {
            GrowthForm::Tree => "tree",
            GrowthForm::Shrub => "shrub",
            GrowthForm::Herb => "herb",
            GrowthForm::VineLiana => "vine/liana",
            GrowthForm::Graminoid => "graminoid",
            GrowthForm::Other => "other",
        }
    }

    /// Conflict multiplier for two forms occupying disjoint vertical niches,
    /// or `None` when the pair has no growth-form complementarity.
    pub fn complementarity(a: Option<Self>, b: Option<Self>) -> Option<f64> {
        use GrowthForm::*;
        match (a?, b?) {
            (VineLiana, Tree) | (Tree, VineLiana) => Some(0.2),
            (Tree, Herb) | (Herb, Tree) => Some(0.4),
            _ => None,
        }
    }
}

/// Koppen climate tier columns, in table order.
pub const CLIMATE_TIERS: [&str; 6] = [
    "tier_1_tropical",
    "tier_2_mediterranean",
    "tier_3_humid_temperate",
    "tier_4_continental",
    "tier_5_boreal_polar",
    "tier_6_arid",
];

/// Read a nitrogen-fixation label ("Yes", "No", "High", "Moderate-Low", ...).
/// Unrecognised labels are unknown.
pub fn nitrogen_fixer_from_label(label: &str) -> Option<bool> {
    match label.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "high" | "moderate-high" => Some(true),
        "no" | "n" | "false" | "low" | "moderate-low" => Some(false),
        _ => None,
    }
}

/// Raw CSR strategy scores (0-100 each).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CsrScores {
    pub c: f64,
    pub s: f64,
    pub r: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: String,
    pub scientific_name: String,
    pub vernacular_name: Option<String>,
    pub csr: Option<CsrScores>,
    pub height_m: Option<f64>,
    pub growth_form: Option<GrowthForm>,
    /// EIVE light indicator.
    pub light_pref: Option<f64>,
    /// `Some(false)` when the source says the plant does not fix nitrogen.
    pub nitrogen_fixer: Option<bool>,
    /// EIVE soil reaction indicator.
    pub soil_ph: Option<f64>,
    /// Climate tiers the plant occurs in; `None` when unknown.
    pub climate_tiers: Option<BTreeSet<String>>,
    /// Missing key = column absent for this plant.
    pub interactions: BTreeMap<Interaction, BTreeSet<String>>,
}

impl PlantRecord {
    pub fn new(id: impl Into<String>, scientific_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scientific_name: scientific_name.into(),
            vernacular_name: None,
            csr: None,
            height_m: None,
            growth_form: None,
            light_pref: None,
            nitrogen_fixer: None,
            soil_ph: None,
            climate_tiers: None,
            interactions: BTreeMap::new(),
        }
    }

    pub fn with_vernacular(mut self, name: impl Into<String>) -> Self {
        self.vernacular_name = Some(name.into());
        self
    }

    pub fn with_csr(mut self, c: f64, s: f64, r: f64) -> Self {
        self.csr = Some(CsrScores { c, s, r });
        self
    }

    pub fn with_height(mut self, height_m: f64) -> Self {
        self.height_m = Some(height_m);
        self
    }

    pub fn with_growth_form(mut self, form: GrowthForm) -> Self {
        self.growth_form = Some(form);
        self
    }

    pub fn with_light(mut self, light: f64) -> Self {
        self.light_pref = Some(light);
        self
    }

    pub fn with_nitrogen_fixer(mut self, fixer: bool) -> Self {
        self.nitrogen_fixer = Some(fixer);
        self
    }

    pub fn with_soil_ph(mut self, ph: f64) -> Self {
        self.soil_ph = Some(ph);
        self
    }

    pub fn with_climate_tiers<I, S>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.climate_tiers = Some(tiers.into_iter().map(Into::into).collect());
        self
    }

    /// Set a category list (marks the column as present).
    pub fn with_organisms<I, S>(mut self, category: Interaction, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interactions
            .insert(category, names.into_iter().map(Into::into).collect());
        self
    }

    pub fn organisms(&self, category: Interaction) -> Option<&BTreeSet<String>> {
        self.interactions.get(&category)
    }

    /// Names in one category; empty when the list is absent.
    pub fn organisms_of(&self, category: Interaction) -> impl Iterator<Item = &str> + '_ {
        self.interactions
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// True if at least one of `categories` is present (possibly empty).
    pub fn has_any(&self, categories: &[Interaction]) -> bool {
        categories.iter().any(|c| self.interactions.contains_key(c))
    }

    /// Names across several categories, in category then name order.
    pub fn organisms_in<'a>(&'a self, categories: &'a [Interaction]) -> impl Iterator<Item = &'a str> + 'a {
        categories
            .iter()
            .filter_map(move |c| self.interactions.get(c))
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// "Scientific (Vernacular)" when a vernacular name is known.
    pub fn display_name(&self) -> String {
        match self.vernacular_name.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => format!("{} ({})", self.scientific_name, v),
            _ => self.scientific_name.clone(),
        }
    }

    fn validate(&self) -> Result<(), GuildError> {
        let malformed = |reason: String| GuildError::MalformedPlant {
            plant: self.id.clone(),
            reason,
        };
        if self.id.trim().is_empty() {
            return Err(malformed("empty identifier".to_string()));
        }
        if let Some(csr) = self.csr {
            for (axis, value) in [('C', csr.c), ('S', csr.s), ('R', csr.r)] {
                if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                    return Err(malformed(format!("CSR {} score {} outside [0, 100]", axis, value)));
                }
            }
        }
        if let Some(h) = self.height_m {
            if !h.is_finite() || h < 0.0 {
                return Err(malformed(format!("height {} is not a non-negative number", h)));
            }
        }
        if let Some(l) = self.light_pref {
            if !l.is_finite() {
                return Err(malformed(format!("light preference {} is not finite", l)));
            }
        }
        if let Some(ph) = self.soil_ph {
            if !ph.is_finite() {
                return Err(malformed(format!("soil pH preference {} is not finite", ph)));
            }
        }
        Ok(())
    }
}

/// Ordered, non-empty plant set plus the climate tier used for calibration.
#[derive(Debug, Clone, Serialize)]
pub struct Guild {
    plants: Vec<PlantRecord>,
    climate_tier: String,
}

impl Guild {
    pub fn new(plants: Vec<PlantRecord>, climate_tier: impl Into<String>) -> Result<Self, GuildError> {
        if plants.is_empty() {
            return Err(GuildError::EmptyGuild);
        }
        let mut seen = BTreeSet::new();
        for plant in &plants {
            plant.validate()?;
            if !seen.insert(plant.id.as_str()) {
                return Err(GuildError::DuplicatePlant { id: plant.id.clone() });
            }
        }
        Ok(Self {
            plants,
            climate_tier: climate_tier.into(),
        })
    }

    pub fn plants(&self) -> &[PlantRecord] {
        &self.plants
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    /// Always false for a constructed guild.
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn climate_tier(&self) -> &str {
        &self.climate_tier
    }

    pub fn plant_ids(&self) -> Vec<&str> {
        self.plants.iter().map(|p| p.id.as_str()).collect()
    }

    /// True if any plant carries any of `categories`.
    pub fn has_category_data(&self, categories: &[Interaction]) -> bool {
        self.plants.iter().any(|p| p.has_any(categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_guild_is_rejected() {
        assert!(matches!(Guild::new(vec![], "tier"), Err(GuildError::EmptyGuild)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let plants = vec![PlantRecord::new("a", "A a"), PlantRecord::new("a", "A a")];
        assert!(matches!(
            Guild::new(plants, "tier"),
            Err(GuildError::DuplicatePlant { id }) if id == "a"
        ));
    }

    #[test]
    fn out_of_range_csr_is_malformed() {
        let plants = vec![PlantRecord::new("a", "A a").with_csr(120.0, 0.0, 0.0)];
        assert!(matches!(Guild::new(plants, "tier"), Err(GuildError::MalformedPlant { .. })));
    }

    #[test]
    fn nan_height_is_malformed() {
        let plants = vec![PlantRecord::new("a", "A a").with_height(f64::NAN)];
        assert!(Guild::new(plants, "tier").is_err());
    }

    #[test]
    fn nitrogen_labels() {
        assert_eq!(nitrogen_fixer_from_label(" Yes"), Some(true));
        assert_eq!(nitrogen_fixer_from_label("Moderate-High"), Some(true));
        assert_eq!(nitrogen_fixer_from_label("moderate-low"), Some(false));
        assert_eq!(nitrogen_fixer_from_label("unknown"), None);
    }

    #[test]
    fn absent_and_empty_lists_differ() {
        let absent = PlantRecord::new("a", "A a");
        let empty = PlantRecord::new("b", "B b").with_organisms(Interaction::Herbivores, Vec::<String>::new());
        assert!(absent.organisms(Interaction::Herbivores).is_none());
        assert_eq!(empty.organisms(Interaction::Herbivores).map(|s| s.len()), Some(0));
    }

    #[test]
    fn growth_form_labels() {
        assert_eq!(GrowthForm::from_label("shrub/tree"), Some(GrowthForm::Tree));
        assert_eq!(GrowthForm::from_label("Liana"), Some(GrowthForm::VineLiana));
        assert_eq!(GrowthForm::from_label("herbaceous perennial"), Some(GrowthForm::Herb));
        assert_eq!(GrowthForm::from_label("  "), None);
        assert_eq!(GrowthForm::complementarity(Some(GrowthForm::Tree), Some(GrowthForm::VineLiana)), Some(0.2));
        assert_eq!(GrowthForm::complementarity(Some(GrowthForm::Herb), Some(GrowthForm::Tree)), Some(0.4));
        assert_eq!(GrowthForm::complementarity(Some(GrowthForm::Shrub), Some(GrowthForm::Tree)), None);
    }

    #[test]
    fn display_name_includes_vernacular() {
        let p = PlantRecord::new("a", "Quercus robur").with_vernacular("English oak");
        assert_eq!(p.display_name(), "Quercus robur (English oak)");
        assert_eq!(PlantRecord::new("b", "Hedera helix").display_name(), "Hedera helix");
    }
}
