//! Raking rescale step
//!
//! One multiplicative adjustment of the weights against the marginal of a
//! single control variable. After the step the variable's weighted shares
//! equal its population proportions; marginals of other variables are
//! disturbed, which is why the raking engine iterates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use svy_core::data::Category;

use crate::base::Result;
use crate::error::ConfigurationError;
use crate::frequency::FrequencyTable;
use crate::population::PopulationTable;
use crate::store::WeightStore;

/// What a rescale step did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescaleOutcome {
    pub variable: String,
    /// Factor applied to every record of each category
    pub factors: IndexMap<Category, f64>,
    /// Valid weighted total before the step
    pub mass_before: f64,
    /// Valid weighted total after the step
    pub mass_after: f64,
}

/// Factors `p_c * N / n_c` that move the current distribution onto `reference`
pub fn rescale_factors(
    frequencies: &FrequencyTable,
    reference: &PopulationTable,
) -> Result<IndexMap<Category, f64>> {
    let variable = reference.variable();
    let total = frequencies.total;
    let mut factors = IndexMap::with_capacity(reference.len());

    for (category, proportion) in reference.iter() {
        let observed = frequencies.count(category);
        if observed <= 0.0 {
            return Err(ConfigurationError::UnobservedCategory {
                variable: variable.to_string(),
                category,
            }
            .into());
        }
        if proportion <= 0.0 {
            return Err(ConfigurationError::ZeroExpectedCount {
                variable: variable.to_string(),
                category,
            }
            .into());
        }
        factors.insert(category, proportion * total / observed);
    }

    Ok(factors)
}

/// Rescale the weights so that `reference.variable()` matches `reference`.
///
/// Records missing the variable keep their weight.
pub fn rescale(store: &mut WeightStore, reference: &PopulationTable) -> Result<RescaleOutcome> {
    let variable = reference.variable();
    let frequencies = FrequencyTable::estimate(store, variable, Some(reference))?;
    let factors = rescale_factors(&frequencies, reference)?;

    store.rescale_by_category(variable, &factors)?;

    Ok(RescaleOutcome {
        variable: variable.to_string(),
        factors,
        mass_before: frequencies.total,
        mass_after: store.valid_mass(variable)?,
    })
}

#[cfg(test)]
mod tests;
