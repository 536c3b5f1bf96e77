//! M2: Growth Compatibility (CSR Conflicts)
//!
//! Detects conflicts between plants with incompatible CSR strategies.
//! Plants above the 75th CSR percentile on an axis are "high" on it; every
//! high-high pairing contributes a base severity that is then modulated by
//! vertical niche separation and, for C-S pairs, by light preference.
//!
//! Conflict types:
//! - C-C: two competitors fight for the same resources
//! - C-S: a competitor shades out a stress-tolerator unless it is shade-adapted
//! - C-R: a competitor crowds out a ruderal
//! - R-R: two ruderals overlap in disturbance niches (low severity)

use serde::Serialize;

use crate::error::MetricError;
use crate::guild::{GrowthForm, Guild};
use crate::lookups::LookupTables;
use crate::metrics::{MetricDetail, MetricId, MetricResult, MetricScore};
use crate::utils::normalization::{csr_to_percentile, CsrAxis};

/// Percentile above which a plant is high on a CSR axis.
const PERCENTILE_THRESHOLD: f64 = 75.0;

/// Light indicator below which a plant is shade-tolerant.
pub(crate) const SHADE_TOLERANT: f64 = 3.2;
/// Light indicator above which a plant is sun-loving.
pub(crate) const SUN_LOVING: f64 = 7.47;

const C_C_SEVERITY: f64 = 1.0;
const C_S_SEVERITY: f64 = 0.6;
const C_S_SUN_SEVERITY: f64 = 0.9;
const C_R_SEVERITY: f64 = 0.8;
const R_R_SEVERITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConflictKind {
    CC,
    CS,
    CR,
    RR,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsrConflict {
    pub kind: ConflictKind,
    pub plant_a: String,
    pub plant_b: String,
    pub severity: f64,
}

/// Per-plant CSR data for the explanation layer.
#[derive(Debug, Clone, Serialize)]
pub struct PlantCsrData {
    pub plant_name: String,
    pub display_name: String,
    pub c_raw: f64,
    pub s_raw: f64,
    pub r_raw: f64,
    pub c_percentile: f64,
    pub s_percentile: f64,
    pub r_percentile: f64,
    pub dominant_strategy: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct M2Detail {
    pub high_c_count: usize,
    pub high_s_count: usize,
    pub high_r_count: usize,
    pub total_conflicts: f64,
    pub conflicts: Vec<CsrConflict>,
    pub plant_csr_data: Vec<PlantCsrData>,
    pub guild_strategy: String,
}

struct PlantRow<'a> {
    index: usize,
    name: &'a str,
    c_percentile: f64,
    s_percentile: f64,
    r_percentile: f64,
    height_m: Option<f64>,
    growth_form: Option<GrowthForm>,
    light_pref: Option<f64>,
}

/// Calculate M2: Growth Compatibility
///
/// Raw score is the conflict density: total modulated conflict divided by
/// n × (n - 1). A single plant cannot conflict and gets the maximum score.
pub fn calculate_m2(guild: &Guild, lookups: &LookupTables) -> Result<MetricResult, MetricError> {
    let csr_cal = lookups.csr_calibration();
    let single = guild.len() < 2;

    let mut plants = Vec::with_capacity(guild.len());
    let mut plant_csr_data = Vec::with_capacity(guild.len());
    for (index, plant) in guild.plants().iter().enumerate() {
        // Defaulting missing CSR would distort conflict detection. A lone
        // plant has no pairs, so it scores the maximum either way.
        let Some(csr) = plant.csr else {
            if single {
                continue;
            }
            return Err(MetricError::MissingTrait {
                plant: plant.id.clone(),
                trait_name: "CSR".to_string(),
            });
        };
        let row = PlantRow {
            index,
            name: &plant.scientific_name,
            c_percentile: csr_to_percentile(csr.c, CsrAxis::C, csr_cal),
            s_percentile: csr_to_percentile(csr.s, CsrAxis::S, csr_cal),
            r_percentile: csr_to_percentile(csr.r, CsrAxis::R, csr_cal),
            height_m: plant.height_m,
            growth_form: plant.growth_form,
            light_pref: plant.light_pref,
        };
        plant_csr_data.push(PlantCsrData {
            plant_name: plant.scientific_name.clone(),
            display_name: plant.display_name(),
            c_raw: csr.c,
            s_raw: csr.s,
            r_raw: csr.r,
            c_percentile: row.c_percentile,
            s_percentile: row.s_percentile,
            r_percentile: row.r_percentile,
            dominant_strategy: determine_dominant_strategy(row.c_percentile, row.s_percentile, row.r_percentile),
        });
        plants.push(row);
    }

    let guild_strategy = if plants.is_empty() {
        String::new()
    } else {
        guild_strategy(&plants)
    };

    if single {
        return Ok(MetricResult {
            metric: MetricId::M2,
            raw: 0.0,
            score: MetricScore::Scored(100.0),
            detail: MetricDetail::M2(M2Detail {
                plant_csr_data,
                guild_strategy,
                ..Default::default()
            }),
        });
    }

    let high_c: Vec<&PlantRow> = plants.iter().filter(|p| p.c_percentile > PERCENTILE_THRESHOLD).collect();
    let high_s: Vec<&PlantRow> = plants.iter().filter(|p| p.s_percentile > PERCENTILE_THRESHOLD).collect();
    let high_r: Vec<&PlantRow> = plants.iter().filter(|p| p.r_percentile > PERCENTILE_THRESHOLD).collect();

    let mut conflicts = Vec::new();
    let mut record = |kind: ConflictKind, a: &PlantRow, b: &PlantRow, severity: f64| {
        if severity > 0.0 {
            conflicts.push(CsrConflict {
                kind,
                plant_a: a.name.to_string(),
                plant_b: b.name.to_string(),
                severity,
            });
        }
    };

    // C-C and R-R are symmetric: each unordered pair once
    for (i, a) in high_c.iter().enumerate() {
        for b in &high_c[i + 1..] {
            record(ConflictKind::CC, a, b, C_C_SEVERITY * vertical_modulation(a, b));
        }
    }
    for c in &high_c {
        for s in &high_s {
            if c.index != s.index {
                record(ConflictKind::CS, c, s, c_s_conflict(c, s));
            }
        }
    }
    for c in &high_c {
        for r in &high_r {
            if c.index != r.index {
                record(ConflictKind::CR, c, r, C_R_SEVERITY * vertical_modulation(c, r));
            }
        }
    }
    for (i, a) in high_r.iter().enumerate() {
        for b in &high_r[i + 1..] {
            record(ConflictKind::RR, a, b, R_R_SEVERITY * vertical_modulation(a, b));
        }
    }

    let total_conflicts: f64 = conflicts.iter().map(|c| c.severity).sum();
    let n = guild.len();
    let max_pairs = (n * (n - 1)) as f64;
    let conflict_density = total_conflicts / max_pairs;

    let detail = M2Detail {
        high_c_count: high_c.len(),
        high_s_count: high_s.len(),
        high_r_count: high_r.len(),
        total_conflicts,
        conflicts,
        plant_csr_data,
        guild_strategy,
    };

    Ok(MetricResult::normalized(
        MetricId::M2,
        conflict_density,
        MetricDetail::M2(detail),
        guild,
        lookups,
    ))
}

/// Vertical niche separation multiplier.
///
/// Complementary growth forms win over height; otherwise the height gap
/// picks the tier. Unknown heights give no reduction.
fn vertical_modulation(a: &PlantRow, b: &PlantRow) -> f64 {
    if let Some(factor) = GrowthForm::complementarity(a.growth_form, b.growth_form) {
        return factor;
    }
    match (a.height_m, b.height_m) {
        (Some(ha), Some(hb)) => {
            let diff = (ha - hb).abs();
            if diff < 2.0 {
                1.0
            } else if diff <= 5.0 {
                0.6
            } else {
                0.3
            }
        }
        _ => 1.0,
    }
}

/// C-S conflict with light-preference modulation of the stress-tolerator.
fn c_s_conflict(c: &PlantRow, s: &PlantRow) -> f64 {
    let s_taller = matches!((c.height_m, s.height_m), (Some(hc), Some(hs)) if hs > hc);
    match s.light_pref {
        // Shade-adapted S wants to sit under the competitor's canopy
        Some(light) if light < SHADE_TOLERANT && !s_taller => 0.0,
        // Sun-loving S gets shaded out
        Some(light) if light > SUN_LOVING => C_S_SUN_SEVERITY * vertical_modulation(c, s),
        _ => C_S_SEVERITY * vertical_modulation(c, s),
    }
}

/// Dominant strategy from percentiles, or "Mixed" if within 20 points.
fn determine_dominant_strategy(c_pct: f64, s_pct: f64, r_pct: f64) -> String {
    let max_pct = c_pct.max(s_pct).max(r_pct);
    let min_pct = c_pct.min(s_pct).min(r_pct);

    if max_pct - min_pct < 20.0 {
        return "Mixed".to_string();
    }

    let (strong, leaning, pct) = if c_pct >= s_pct && c_pct >= r_pct {
        ("Competitive", "C-leaning", c_pct)
    } else if s_pct >= r_pct {
        ("Stress-tolerant", "S-leaning", s_pct)
    } else {
        ("Ruderal", "R-leaning", r_pct)
    };
    let label = if pct > PERCENTILE_THRESHOLD { strong } else { leaning };
    label.to_string()
}

fn guild_strategy(plants: &[PlantRow]) -> String {
    let n = plants.len().max(1) as f64;
    let (c, s, r) = plants.iter().fold((0.0, 0.0, 0.0), |(c, s, r), p| {
        (c + p.c_percentile, s + p.s_percentile, r + p.r_percentile)
    });
    determine_dominant_strategy(c / n, s / n, r / n)
}
