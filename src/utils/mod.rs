//! Utility modules for guild scoring
//!
//! Shared functionality used across multiple metrics:
//! - Normalization: percentile transformation
//! - Organism matching and counting
//! - Newick trees for phylogenetic diversity

pub mod newick;
pub mod normalization;
pub mod organism_counter;
pub mod organism_matcher;

pub use newick::PhyloTree;
pub use normalization::{csr_to_percentile, percentile_normalize, Calibration, CsrAxis, CsrCalibration, PercentileParams};
pub use organism_counter::{count_shared_organisms, plants_with_any, OrganismTally, TallyEntry};
pub use organism_matcher::{canonical_name, find_matches, keyed_names, names_match, NameLookup, NameSet};
