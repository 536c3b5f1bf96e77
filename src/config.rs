//! Scoring configuration and data file locations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Relative weight of the Universal (M1-M4) and Bonus (M5-M7) tiers.
///
/// The default 4:3 split makes the overall score equal to the plain mean of
/// all seven metrics when every metric is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub universal: f64,
    pub bonus: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            universal: 4.0 / 7.0,
            bonus: 3.0 / 7.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub tier_weights: TierWeights,
    /// Organisms listed per network profile ranking.
    pub top_n: usize,
    /// Run metrics and analyzers on the rayon pool.
    pub parallel: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tier_weights: TierWeights::default(),
            top_n: 10,
            parallel: true,
        }
    }
}

impl ScoringConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config: {}", path.display()))?;
        let config: ScoringConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse scoring config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let TierWeights { universal, bonus } = self.tier_weights;
        let valid = universal.is_finite()
            && bonus.is_finite()
            && universal >= 0.0
            && bonus >= 0.0
            && universal + bonus > 0.0;
        if !valid {
            return Err(ConfigError::InvalidWeights { universal, bonus });
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        Ok(())
    }
}

/// Locations of every input the loader reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    pub plants: PathBuf,
    pub organisms: PathBuf,
    pub fungi: PathBuf,
    pub herbivore_predators: PathBuf,
    pub insect_parasites: PathBuf,
    pub pathogen_antagonists: PathBuf,
    #[serde(default)]
    pub organism_categories: Option<PathBuf>,
    pub calibration: PathBuf,
    #[serde(default)]
    pub csr_calibration: Option<PathBuf>,
    pub tree: PathBuf,
    #[serde(default)]
    pub tree_mapping: Option<PathBuf>,
}

impl DataPaths {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data paths: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse data paths: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_weights_reproduce_plain_mean() {
        let w = TierWeights::default();
        assert_relative_eq!(w.universal + w.bonus, 1.0, epsilon = 1e-12);
        assert_relative_eq!(w.universal / 4.0, w.bonus / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ScoringConfig = serde_json::from_str(r#"{"top_n": 5}"#).unwrap();
        assert_eq!(config.top_n, 5);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_or_zero_weights() {
        let mut config = ScoringConfig::default();
        config.tier_weights = TierWeights { universal: -1.0, bonus: 2.0 };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeights { .. })));

        config.tier_weights = TierWeights { universal: 0.0, bonus: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_top_n() {
        let config = ScoringConfig { top_n: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTopN)));
    }
}
