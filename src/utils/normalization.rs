//! Normalization Utilities
//!
//! Converts raw metric scores to percentiles using climate tier-stratified
//! reference distributions, and raw CSR scores to global CSR percentiles.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::NormalizationError;
use crate::metrics::MetricId;

const PERCENTILES: [f64; 13] = [
    1.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 99.0,
];

const CSR_PERCENTILES: [f64; 15] = [
    1.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 99.0,
];

/// Reference-distribution breakpoints for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileParams {
    pub p1: f64,
    pub p5: f64,
    pub p10: f64,
    pub p20: f64,
    pub p30: f64,
    pub p40: f64,
    pub p50: f64,
    pub p60: f64,
    pub p70: f64,
    pub p80: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl PercentileParams {
    /// Breakpoint values in p1..p99 order.
    pub fn from_values(v: [f64; 13]) -> Self {
        Self {
            p1: v[0],
            p5: v[1],
            p10: v[2],
            p20: v[3],
            p30: v[4],
            p40: v[5],
            p50: v[6],
            p60: v[7],
            p70: v[8],
            p80: v[9],
            p90: v[10],
            p95: v[11],
            p99: v[12],
        }
    }

    /// Breakpoints placed linearly between `lo` (p0) and `hi` (p100).
    pub fn linear(lo: f64, hi: f64) -> Self {
        Self::from_values(PERCENTILES.map(|p| lo + (hi - lo) * p / 100.0))
    }

    pub fn values(&self) -> [f64; 13] {
        [
            self.p1, self.p5, self.p10, self.p20, self.p30, self.p40, self.p50,
            self.p60, self.p70, self.p80, self.p90, self.p95, self.p99,
        ]
    }
}

/// Calibration for a single climate tier. Keys follow the calibration JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCalibration {
    m1: Option<PercentileParams>,
    n4: Option<PercentileParams>,
    p1: Option<PercentileParams>,
    p2: Option<PercentileParams>,
    p3: Option<PercentileParams>,
    p5: Option<PercentileParams>,
    p6: Option<PercentileParams>,
}

impl TierCalibration {
    fn slot(&self, metric: MetricId) -> &Option<PercentileParams> {
        match metric {
            MetricId::M1 => &self.m1,
            MetricId::M2 => &self.n4,
            MetricId::M3 => &self.p1,
            MetricId::M4 => &self.p2,
            MetricId::M5 => &self.p3,
            MetricId::M6 => &self.p5,
            MetricId::M7 => &self.p6,
        }
    }

    fn slot_mut(&mut self, metric: MetricId) -> &mut Option<PercentileParams> {
        match metric {
            MetricId::M1 => &mut self.m1,
            MetricId::M2 => &mut self.n4,
            MetricId::M3 => &mut self.p1,
            MetricId::M4 => &mut self.p2,
            MetricId::M5 => &mut self.p3,
            MetricId::M6 => &mut self.p5,
            MetricId::M7 => &mut self.p6,
        }
    }

    pub fn get(&self, metric: MetricId) -> Option<&PercentileParams> {
        self.slot(metric).as_ref()
    }
}

/// Per-tier reference distributions for all metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(flatten)]
    tiers: HashMap<String, TierCalibration>,
}

impl Calibration {
    /// Load calibration from JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read calibration file: {:?}", path))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid calibration file: {:?}", path))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let calibration: Calibration =
            serde_json::from_str(json).context("Failed to parse calibration JSON")?;
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn with_metric(mut self, tier: &str, metric: MetricId, params: PercentileParams) -> Self {
        *self
            .tiers
            .entry(tier.to_string())
            .or_default()
            .slot_mut(metric) = Some(params);
        self
    }

    pub fn has_tier(&self, tier: &str) -> bool {
        self.tiers.contains_key(tier)
    }

    pub fn tier_names(&self) -> impl Iterator<Item = &str> {
        self.tiers.keys().map(String::as_str)
    }

    /// Breakpoints must be finite and non-decreasing.
    pub fn validate(&self) -> Result<(), NormalizationError> {
        for (tier, cal) in &self.tiers {
            for metric in MetricId::ALL {
                if let Some(params) = cal.get(metric) {
                    if !is_monotonic(&params.values()) {
                        return Err(NormalizationError::NonMonotonic {
                            metric: metric.calibration_key().to_string(),
                            tier: tier.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_monotonic(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[0] <= w[1])
}

/// Percentile rank of `raw` within the tier's reference distribution.
///
/// Values at or below the p1 breakpoint map to 0 and values at or above p99
/// map to 100; between breakpoints the percentile is linearly interpolated.
/// A missing tier or metric is an error, never a default.
pub fn percentile_normalize(
    raw_value: f64,
    metric: MetricId,
    calibration: &Calibration,
    climate_tier: &str,
) -> Result<f64, NormalizationError> {
    let tier = calibration
        .tiers
        .get(climate_tier)
        .ok_or_else(|| NormalizationError::UnknownTier {
            tier: climate_tier.to_string(),
        })?;
    let params = tier.get(metric).ok_or_else(|| NormalizationError::MissingMetric {
        metric,
        tier: climate_tier.to_string(),
    })?;
    Ok(interpolate(raw_value, &params.values(), &PERCENTILES))
}

fn interpolate<const N: usize>(raw: f64, values: &[f64; N], percentiles: &[f64; N]) -> f64 {
    // NaN falls through to the lower bound
    if !(raw > values[0]) {
        return 0.0;
    }
    if raw >= values[N - 1] {
        return 100.0;
    }
    for i in 0..N - 1 {
        if values[i] <= raw && raw <= values[i + 1] {
            let span = values[i + 1] - values[i];
            let fraction = if span > 0.0 { (raw - values[i]) / span } else { 0.0 };
            return percentiles[i] + fraction * (percentiles[i + 1] - percentiles[i]);
        }
    }
    // Unreachable for validated (non-decreasing) breakpoints
    100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrAxis {
    C,
    S,
    R,
}

/// CSR Calibration parameters (global, not tier-specific)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrCalibration {
    c: CsrPercentileParams,
    s: CsrPercentileParams,
    r: CsrPercentileParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsrPercentileParams {
    p1: f64,
    p5: f64,
    p10: f64,
    p20: f64,
    p30: f64,
    p40: f64,
    p50: f64,
    p60: f64,
    p70: f64,
    p75: f64,
    p80: f64,
    p85: f64,
    p90: f64,
    p95: f64,
    p99: f64,
}

impl CsrPercentileParams {
    fn values(&self) -> [f64; 15] {
        [
            self.p1, self.p5, self.p10, self.p20, self.p30, self.p40, self.p50, self.p60,
            self.p70, self.p75, self.p80, self.p85, self.p90, self.p95, self.p99,
        ]
    }
}

impl CsrCalibration {
    /// Load CSR calibration from JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read CSR calibration file: {:?}", path))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cal: CsrCalibration =
            serde_json::from_str(json).context("Failed to parse CSR calibration JSON")?;
        for (axis, params) in [("c", &cal.c), ("s", &cal.s), ("r", &cal.r)] {
            if !is_monotonic(&params.values()) {
                anyhow::bail!("CSR breakpoints for axis {} are not non-decreasing", axis);
            }
        }
        Ok(cal)
    }
}

/// Convert a raw CSR score to a global percentile.
///
/// Without a calibration, fixed thresholds apply: C and S at or above 60 and
/// R at or above 50 count as 100, anything else as 50.
pub fn csr_to_percentile(raw_value: f64, axis: CsrAxis, csr_calibration: Option<&CsrCalibration>) -> f64 {
    let Some(cal) = csr_calibration else {
        let threshold = match axis {
            CsrAxis::C | CsrAxis::S => 60.0,
            CsrAxis::R => 50.0,
        };
        return if raw_value >= threshold { 100.0 } else { 50.0 };
    };

    let params = match axis {
        CsrAxis::C => &cal.c,
        CsrAxis::S => &cal.s,
        CsrAxis::R => &cal.r,
    };
    interpolate(raw_value, &params.values(), &CSR_PERCENTILES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TIER: &str = "tier_3_humid_temperate";

    fn calibration() -> Calibration {
        Calibration::default().with_metric(TIER, MetricId::M7, PercentileParams::linear(0.0, 1.0))
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let cal = calibration();
        assert_relative_eq!(percentile_normalize(0.5, MetricId::M7, &cal, TIER).unwrap(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(percentile_normalize(0.25, MetricId::M7, &cal, TIER).unwrap(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn clamps_outside_reference_range() {
        let cal = calibration();
        assert_eq!(percentile_normalize(-3.0, MetricId::M7, &cal, TIER).unwrap(), 0.0);
        assert_eq!(percentile_normalize(0.01, MetricId::M7, &cal, TIER).unwrap(), 0.0);
        assert_eq!(percentile_normalize(7.0, MetricId::M7, &cal, TIER).unwrap(), 100.0);
        assert_eq!(percentile_normalize(f64::NAN, MetricId::M7, &cal, TIER).unwrap(), 0.0);
    }

    #[test]
    fn monotonic_in_raw_value() {
        let cal = calibration();
        let mut last = -1.0;
        for i in 0..=100 {
            let p = percentile_normalize(i as f64 / 100.0, MetricId::M7, &cal, TIER).unwrap();
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn flat_breakpoints_return_lower_percentile() {
        let cal = Calibration::default().with_metric(
            TIER,
            MetricId::M3,
            PercentileParams::from_values([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        );
        // raw at the flat run resolves to p1 (the lower bound)
        assert_eq!(percentile_normalize(0.0, MetricId::M3, &cal, TIER).unwrap(), 0.0);
        assert_relative_eq!(percentile_normalize(0.5, MetricId::M3, &cal, TIER).unwrap(), 55.0, epsilon = 1e-9);
    }

    #[test]
    fn unknown_tier_and_metric_are_errors() {
        let cal = calibration();
        assert!(matches!(
            percentile_normalize(0.5, MetricId::M7, &cal, "tier_9_unknown"),
            Err(NormalizationError::UnknownTier { .. })
        ));
        assert!(matches!(
            percentile_normalize(0.5, MetricId::M1, &cal, TIER),
            Err(NormalizationError::MissingMetric { metric: MetricId::M1, .. })
        ));
    }

    #[test]
    fn json_keys_follow_calibration_file() {
        let json = serde_json::json!({
            TIER: { "n4": PercentileParams::linear(0.0, 2.0) }
        })
        .to_string();
        let cal = Calibration::from_json_str(&json).unwrap();
        assert_relative_eq!(percentile_normalize(1.0, MetricId::M2, &cal, TIER).unwrap(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_decreasing_breakpoints() {
        let mut values = PercentileParams::linear(0.0, 1.0).values();
        values.swap(3, 4);
        let json = serde_json::json!({ TIER: { "p6": PercentileParams::from_values(values) } }).to_string();
        assert!(Calibration::from_json_str(&json).is_err());
    }

    #[test]
    fn csr_fallback_thresholds() {
        assert_eq!(csr_to_percentile(60.0, CsrAxis::C, None), 100.0);
        assert_eq!(csr_to_percentile(59.9, CsrAxis::S, None), 50.0);
        assert_eq!(csr_to_percentile(50.0, CsrAxis::R, None), 100.0);
    }

    #[test]
    fn csr_calibrated_interpolation() {
        let axis = serde_json::json!({
            "p1": 1.0, "p5": 5.0, "p10": 10.0, "p20": 20.0, "p30": 30.0, "p40": 40.0,
            "p50": 50.0, "p60": 60.0, "p70": 70.0, "p75": 75.0, "p80": 80.0, "p85": 85.0,
            "p90": 90.0, "p95": 95.0, "p99": 99.0
        });
        let json = serde_json::json!({ "c": axis, "s": axis, "r": axis }).to_string();
        let cal = CsrCalibration::from_json_str(&json).unwrap();
        assert_relative_eq!(csr_to_percentile(77.5, CsrAxis::C, Some(&cal)), 77.5, epsilon = 1e-9);
        assert_eq!(csr_to_percentile(0.5, CsrAxis::R, Some(&cal)), 0.0);
    }
}
