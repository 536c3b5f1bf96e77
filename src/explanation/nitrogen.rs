use crate::explanation::types::{Severity, WarningCard, WarningKind};
use crate::guild::Guild;

/// More fixers than this risks over-fertilizing the bed.
const MAX_NITROGEN_FIXERS: usize = 2;

/// Check nitrogen fixation status of guild
///
/// Returns a warning if more than two plants fix nitrogen. Plants with an
/// unknown status are not counted.
pub fn check_nitrogen_fixation(guild: &Guild) -> Option<WarningCard> {
    let fixers: Vec<&str> = guild
        .plants()
        .iter()
        .filter(|p| p.nitrogen_fixer == Some(true))
        .map(|p| p.scientific_name.as_str())
        .collect();

    if fixers.len() <= MAX_NITROGEN_FIXERS {
        return None;
    }
    Some(WarningCard {
        warning_type: WarningKind::NitrogenExcess,
        severity: Severity::Medium,
        message: format!("{} nitrogen-fixing plants may over-fertilize", fixers.len()),
        detail: format!(
            "Fixers: {}. Excess nitrogen can favor fast-growing weeds and reduce soil biodiversity",
            fixers.join(", ")
        ),
        advice: "Reduce to 1-2 nitrogen fixers or add nitrogen-demanding plants".to_string(),
    })
}
