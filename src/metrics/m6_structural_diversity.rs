//! M6: Structural Diversity (vertical stratification)
//!
//! Scores vertical stratification quality and growth form diversity.
//! Height differences are validated against the shorter plant's light
//! preference, except where growth forms are complementary (vine on a tree,
//! herb under a tree): those pairs always get full credit.
//!
//! raw = 0.7 × stratification quality + 0.3 × form diversity

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::MetricError;
use crate::guild::{Guild, GrowthForm, PlantRecord};
use crate::lookups::LookupTables;
use crate::metrics::m2_growth_compatibility::{SHADE_TOLERANT, SUN_LOVING};
use crate::metrics::{MetricDetail, MetricId, MetricResult};

/// Only differences above this count as separate canopy layers.
const LAYER_GAP_M: f64 = 2.0;
const STRATIFICATION_WEIGHT: f64 = 0.7;
const FORM_WEIGHT: f64 = 0.3;

/// Plant with height and light preference information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantHeight {
    pub name: String,
    pub height_m: f64,
    pub light_pref: Option<f64>,
}

/// Growth form group with plants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthFormGroup {
    pub form: GrowthForm,
    pub plants: Vec<PlantHeight>,
    pub height_range: (f64, f64),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct M6Detail {
    /// Tallest minus shortest known height.
    pub height_range: f64,
    pub n_forms: usize,
    pub stratification_quality: f64,
    pub form_diversity: f64,
    pub valid_stratification: f64,
    pub invalid_stratification: f64,
    /// Sorted by minimum height.
    pub growth_form_groups: Vec<GrowthFormGroup>,
}

/// Credit for one tall/short pair: `(valid, invalid)` height-difference shares.
fn pair_credit(short: &PlantRecord, tall: &PlantRecord, diff: f64) -> (f64, f64) {
    if GrowthForm::complementarity(short.growth_form, tall.growth_form).is_some() {
        return (diff, 0.0);
    }
    match short.light_pref {
        None => (diff * 0.5, 0.0),
        Some(light) if light < SHADE_TOLERANT => (diff, 0.0),
        Some(light) if light > SUN_LOVING => (0.0, diff),
        Some(_) => (diff * 0.6, 0.0),
    }
}

/// Calculate M6: Structural Diversity
///
/// Plants without a height are left out of stratification but still count
/// toward form diversity.
pub fn calculate_m6(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    let mut sorted: Vec<(&PlantRecord, f64)> = guild
        .plants()
        .iter()
        .filter_map(|p| p.height_m.map(|h| (p, h)))
        .collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut valid_stratification = 0.0;
    let mut invalid_stratification = 0.0;
    for (i, (short, short_h)) in sorted.iter().enumerate() {
        for (tall, tall_h) in &sorted[i + 1..] {
            let diff = tall_h - short_h;
            if diff > LAYER_GAP_M {
                let (valid, invalid) = pair_credit(short, tall, diff);
                valid_stratification += valid;
                invalid_stratification += invalid;
            }
        }
    }

    let total = valid_stratification + invalid_stratification;
    let stratification_quality = if total > 0.0 {
        valid_stratification / total
    } else {
        0.0
    };

    let growth_form_groups = group_by_form(guild);
    let n_forms = growth_form_groups.len();
    let form_diversity = (n_forms as f64 / GrowthForm::COUNT as f64).min(1.0);

    let raw = STRATIFICATION_WEIGHT * stratification_quality + FORM_WEIGHT * form_diversity;

    let height_range = match (sorted.first(), sorted.last()) {
        (Some((_, lo)), Some((_, hi))) => hi - lo,
        _ => 0.0,
    };

    let detail = M6Detail {
        height_range,
        n_forms,
        stratification_quality,
        form_diversity,
        valid_stratification,
        invalid_stratification,
        growth_form_groups,
    };
    Ok(MetricResult::normalized(MetricId::M6, raw, MetricDetail::M6(detail), guild, lookups))
}

fn group_by_form(guild: &Guild) -> Vec<GrowthFormGroup> {
    let mut groups: BTreeMap<GrowthForm, Vec<&PlantRecord>> = BTreeMap::new();
    for plant in guild.plants() {
        if let Some(form) = plant.growth_form {
            groups.entry(form).or_default().push(plant);
        }
    }

    let mut out: Vec<GrowthFormGroup> = groups
        .into_iter()
        .map(|(form, members)| {
            let plants: Vec<PlantHeight> = members
                .iter()
                .filter_map(|p| {
                    p.height_m.map(|height_m| PlantHeight {
                        name: p.display_name(),
                        height_m,
                        light_pref: p.light_pref,
                    })
                })
                .collect();
            let height_range = plants.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.height_m), hi.max(p.height_m))
            });
            let height_range = if plants.is_empty() { (0.0, 0.0) } else { height_range };
            GrowthFormGroup {
                form,
                plants,
                height_range,
            }
        })
        .collect();

    // Sort by min height for consistent display
    out.sort_by(|a, b| a.height_range.0.total_cmp(&b.height_range.0).then(a.form.cmp(&b.form)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalization::{Calibration, PercentileParams};
    use approx::assert_relative_eq;

    const TIER: &str = "tier_3_humid_temperate";

    fn lookups() -> LookupTables {
        let calibration = Calibration::default().with_metric(TIER, MetricId::M6, PercentileParams::linear(0.0, 1.0));
        LookupTables::new(calibration, Default::default())
    }

    fn detail(result: &MetricResult) -> &M6Detail {
        match &result.detail {
            MetricDetail::M6(d) => d,
            _ => panic!("wrong detail"),
        }
    }

    fn plant(id: &str, height: f64, form: GrowthForm, light: f64) -> PlantRecord {
        PlantRecord::new(id, id)
            .with_height(height)
            .with_growth_form(form)
            .with_light(light)
    }

    #[test]
    fn vine_on_oak_gets_full_credit() {
        let guild = Guild::new(
            vec![
                plant("Oak", 20.0, GrowthForm::Tree, 7.0),
                plant("Vine", 8.0, GrowthForm::VineLiana, 7.0),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m6(&guild, &lookups()).unwrap();
        let d = detail(&result);
        assert_relative_eq!(d.stratification_quality, 1.0);
        assert_relative_eq!(d.valid_stratification, 12.0);
        assert_relative_eq!(d.form_diversity, 2.0 / 6.0);
        assert_relative_eq!(result.raw, 0.7 + 0.3 * 2.0 / 6.0);
    }

    #[test]
    fn complementarity_overrides_sun_loving_understory() {
        let guild = Guild::new(
            vec![
                plant("tree", 15.0, GrowthForm::Tree, 6.0),
                plant("herb", 0.5, GrowthForm::Herb, 8.5),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m6(&guild, &lookups()).unwrap();
        assert_relative_eq!(detail(&result).invalid_stratification, 0.0);
        assert_relative_eq!(detail(&result).stratification_quality, 1.0);
    }

    #[test]
    fn light_preference_branches() {
        let guild = Guild::new(
            vec![
                plant("tall", 10.0, GrowthForm::Shrub, 5.0),
                plant("sunny", 1.0, GrowthForm::Shrub, 8.0),
                plant("shady", 4.0, GrowthForm::Shrub, 2.0),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m6(&guild, &lookups()).unwrap();
        let d = detail(&result);
        // sunny under shady (3) and tall (9) are invalid; shady under tall (6) is valid
        assert_relative_eq!(d.invalid_stratification, 12.0);
        assert_relative_eq!(d.valid_stratification, 6.0);
        assert_relative_eq!(d.stratification_quality, 6.0 / 18.0);
        assert_eq!(d.n_forms, 1);
    }

    #[test]
    fn small_gaps_and_unknown_heights_are_ignored() {
        let guild = Guild::new(
            vec![
                plant("a", 3.0, GrowthForm::Shrub, 5.0),
                plant("b", 1.5, GrowthForm::Herb, 5.0),
                PlantRecord::new("c", "c").with_growth_form(GrowthForm::Graminoid),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m6(&guild, &lookups()).unwrap();
        let d = detail(&result);
        assert_eq!(d.stratification_quality, 0.0);
        assert_eq!(d.n_forms, 3);
        assert_relative_eq!(d.height_range, 1.5);
        assert_relative_eq!(result.raw, 0.3 * 0.5);
    }

    #[test]
    fn unknown_light_counts_half() {
        let guild = Guild::new(
            vec![
                PlantRecord::new("low", "low").with_height(1.0),
                PlantRecord::new("high", "high").with_height(6.0),
            ],
            TIER,
        )
        .unwrap();
        let result = calculate_m6(&guild, &lookups()).unwrap();
        assert_relative_eq!(detail(&result).valid_stratification, 2.5);
        assert_relative_eq!(detail(&result).stratification_quality, 1.0);
    }
}
