//! Climate compatibility
//!
//! Plants only belong together if their climate tiers overlap. The guild's
//! calibration tier should also be one of the shared tiers, or the metric
//! percentiles come from a climate none of the plants grows in.

use std::collections::BTreeSet;

use crate::explanation::types::{Severity, WarningCard, WarningKind};
use crate::guild::Guild;

/// Tiers every plant with tier data occurs in, or `None` when no plant has any.
pub fn shared_climate_tiers(guild: &Guild) -> Option<BTreeSet<String>> {
    let mut known = guild.plants().iter().filter_map(|p| p.climate_tiers.as_ref());
    let mut shared = known.next()?.clone();
    for tiers in known {
        shared.retain(|tier| tiers.contains(tier));
    }
    Some(shared)
}

/// Check climate compatibility of guild
pub fn check_climate_compatibility(guild: &Guild) -> Option<WarningCard> {
    let shared = shared_climate_tiers(guild)?;

    if shared.is_empty() {
        return Some(WarningCard {
            warning_type: WarningKind::NoSharedClimate,
            severity: Severity::High,
            message: "Plants have no overlapping climate zones".to_string(),
            detail: format!(
                "No climate tier is common to all {} plants with tier data",
                guild.plants().iter().filter(|p| p.climate_tiers.is_some()).count()
            ),
            advice: "Replace plants so the guild shares at least one climate tier".to_string(),
        });
    }

    if !shared.contains(guild.climate_tier()) {
        return Some(WarningCard {
            warning_type: WarningKind::CalibrationTierOutsideRange,
            severity: Severity::Low,
            message: format!("Guild scored against {}, which not every plant occurs in", guild.climate_tier()),
            detail: format!(
                "Shared tiers: {}",
                shared.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
            ),
            advice: "Score the guild against one of its shared climate tiers".to_string(),
        });
    }

    None
}
