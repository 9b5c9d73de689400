//! Core traits and types for weighting methods
//!
//! This module defines the interface shared by the weighting methods
//! (post-stratification and raking) and the crate-wide result type.

pub use crate::error::{ConfigurationError, WeightingError};
use crate::store::WeightStore;

/// Result type for weighting operations
pub type Result<T> = std::result::Result<T, WeightingError>;

/// A procedure that adjusts the weights held by a [`WeightStore`]
pub trait WeightingMethod {
    /// What the method reports back besides the adjusted weights
    type Output;

    /// Check the store against the method's configuration without mutating it
    fn validate(&self, store: &WeightStore) -> Result<()>;

    /// Adjust the weights in place
    fn apply(&self, store: &mut WeightStore) -> Result<Self::Output>;
}
