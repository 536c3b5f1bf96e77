use crate::explanation::types::{Severity, WarningCard, WarningKind};
use crate::guild::Guild;

/// Preferences further apart than this cannot share one bed.
const MAX_PH_RANGE: f64 = 2.0;

/// Check soil pH compatibility of guild
///
/// Returns a warning if pH preferences differ by more than two units.
/// Plants without a preference are skipped.
pub fn check_soil_ph_compatibility(guild: &Guild) -> Option<WarningCard> {
    let ph_prefs: Vec<f64> = guild.plants().iter().filter_map(|p| p.soil_ph).collect();
    if ph_prefs.is_empty() {
        return None;
    }

    let min_ph = ph_prefs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_ph = ph_prefs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ph_range = max_ph - min_ph;

    if ph_range <= MAX_PH_RANGE {
        return None;
    }
    Some(WarningCard {
        warning_type: WarningKind::PhIncompatible,
        severity: Severity::High,
        message: "Incompatible soil pH preferences detected".to_string(),
        detail: format!("pH range: {:.1}-{:.1} (difference: {:.1} units)", min_ph, max_ph, ph_range),
        advice: "Group acid-loving and alkaline-preferring plants separately".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::PlantRecord;

    fn guild(prefs: &[Option<f64>]) -> Guild {
        let plants = prefs
            .iter()
            .enumerate()
            .map(|(i, ph)| {
                let plant = PlantRecord::new(format!("p{i}"), format!("Plant {i}"));
                match ph {
                    Some(ph) => plant.with_soil_ph(*ph),
                    None => plant,
                }
            })
            .collect();
        Guild::new(plants, "tier_3_humid_temperate").unwrap()
    }

    #[test]
    fn test_incompatible_ph() {
        // Range 3.3 > 2.0
        let w = check_soil_ph_compatibility(&guild(&[Some(4.5), Some(7.8), Some(5.2)])).unwrap();
        assert_eq!(w.warning_type, WarningKind::PhIncompatible);
        assert_eq!(w.severity, Severity::High);
        assert!(w.detail.contains("4.5-7.8"));
    }

    #[test]
    fn test_compatible_ph() {
        assert!(check_soil_ph_compatibility(&guild(&[Some(6.0), Some(6.5), Some(7.5)])).is_none());
    }

    #[test]
    fn test_missing_ph_values() {
        assert!(check_soil_ph_compatibility(&guild(&[None, None, None])).is_none());
        // One known preference has no range
        assert!(check_soil_ph_compatibility(&guild(&[Some(3.0), None])).is_none());
    }
}
