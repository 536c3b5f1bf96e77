//! Network explanation layer
//!
//! Turns metric side-channels and raw interaction lists into network
//! profiles: who threatens whom, who protects whom and which plants are hubs.

pub mod types;
pub mod unified_taxonomy;
pub mod pest_analysis;
pub mod biocontrol_network_analysis;
pub mod pathogen_control_network_analysis;
pub mod fungi_network_analysis;
pub mod pollinator_network_analysis;
pub mod nitrogen;
pub mod soil_ph;
pub mod climate;

pub use types::{
    CategoryShare, NetworkAnalysis, NetworkProfiles, PlantHub, RankedOrganism, Severity, WarningCard, WarningKind,
};
pub use unified_taxonomy::{OrganismCategory, OrganismRole, PollinatorCategory};

pub use pest_analysis::{analyze_guild_pests, PestProfile};
pub use biocontrol_network_analysis::{analyze_biocontrol_network, BiocontrolNetworkProfile, MatchedBiocontrolPair};
pub use pathogen_control_network_analysis::{
    analyze_pathogen_control_network, MatchedAntagonistPair, PathogenControlNetworkProfile,
};
pub use fungi_network_analysis::{analyze_fungi_network, FungiNetworkProfile, NetworkFungus, PlantFungalHub};
pub use pollinator_network_analysis::{analyze_pollinator_network, PollinatorNetworkProfile};
pub use nitrogen::check_nitrogen_fixation;
pub use soil_ph::check_soil_ph_compatibility;
pub use climate::{check_climate_compatibility, shared_climate_tiers};

use crate::guild::Guild;

/// Guild-level warnings, most severe first.
pub fn guild_warnings(guild: &Guild) -> Vec<WarningCard> {
    let mut warnings: Vec<WarningCard> = [
        check_climate_compatibility(guild),
        check_soil_ph_compatibility(guild),
        check_nitrogen_fixation(guild),
    ]
    .into_iter()
    .flatten()
    .collect();
    warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
    warnings
}
