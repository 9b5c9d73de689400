//! Survey weighting
//!
//! Adjusts per-respondent weights so that a sample's marginal distributions
//! match known population marginals:
//!
//! - [`strata`]: one-shot post-stratification over sex/age/area strata
//! - [`raking`]: iterative proportional fitting over control variables,
//!   driven by a chi-square goodness-of-fit check and capped in passes
//! - [`tables`]: weighted frequency and cross tables for inspecting results
//!
//! [`weighting::Weighting`] runs these over a [`svy_core::DataFrame`].

pub mod base;
pub mod error;
pub mod frequency;
pub mod goodness_of_fit;
pub mod population;
pub mod raking;
pub mod rescale;
pub mod store;
pub mod strata;
pub mod tables;
pub mod weighting;

pub use base::{Result, WeightingMethod};
pub use error::{ConfigurationError, WeightingError};
pub use frequency::FrequencyTable;
pub use goodness_of_fit::{ChiSquareTest, GoodnessOfFit};
pub use population::{Population, PopulationTable, StratumEntry, StratumTable};
pub use raking::{RakingConfig, RakingEngine, RakingOutcome, RakingReport, RakingState};
pub use rescale::{rescale, RescaleOutcome};
pub use store::WeightStore;
pub use strata::{PostStratification, PostStratifier, StratumAssigner};
pub use tables::{crosstab, freq, freq_with_labels, CrossTable, FreqRow, PercentBy};
pub use weighting::{Weighting, WeightingConfig};
