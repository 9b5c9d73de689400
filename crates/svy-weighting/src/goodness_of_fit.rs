//! Chi-square goodness-of-fit check
//!
//! Compares the weighted distribution of one control variable with its
//! population reference. Used by the raking engine as its convergence
//! criterion.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::base::Result;
use crate::error::{ConfigurationError, WeightingError};
use crate::frequency::FrequencyTable;
use crate::population::PopulationTable;
use crate::store::WeightStore;

/// Significance level below which a variable is judged inconsistent
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Outcome of one goodness-of-fit check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    pub variable: String,
    /// Pearson chi-square statistic
    pub statistic: f64,
    /// Degrees of freedom (categories - 1)
    pub df: usize,
    pub p_value: f64,
    /// `p_value >= significance`
    pub consistent: bool,
    /// Observed weighted counts, rounded, in reference order
    pub observed: Vec<f64>,
    /// Expected counts in reference order
    pub expected: Vec<f64>,
}

/// Pearson chi-square test at a fixed significance level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareTest {
    significance: f64,
}

impl Default for ChiSquareTest {
    fn default() -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

impl ChiSquareTest {
    /// Create a test at `significance`, which must lie in (0, 1)
    pub fn new(significance: f64) -> Result<Self> {
        if !(significance > 0.0 && significance < 1.0) {
            return Err(ConfigurationError::invalid_config(format!(
                "significance {significance} is outside (0, 1)"
            ))
            .into());
        }
        Ok(Self { significance })
    }

    pub fn significance(&self) -> f64 {
        self.significance
    }

    /// Check the current weighted distribution of `reference.variable()`.
    ///
    /// Observed counts are the weighted counts rounded to the nearest
    /// integer. Expected counts are the valid weighted total times the
    /// population proportion. Does not touch the weights.
    pub fn check(&self, store: &WeightStore, reference: &PopulationTable) -> Result<GoodnessOfFit> {
        let variable = reference.variable();
        let frequencies = FrequencyTable::estimate(store, variable, Some(reference))?;

        let mut observed = Vec::with_capacity(reference.len());
        let mut expected = Vec::with_capacity(reference.len());
        for (category, proportion) in reference.iter() {
            let exp = frequencies.total * proportion;
            if exp <= 0.0 {
                return Err(ConfigurationError::ZeroExpectedCount {
                    variable: variable.to_string(),
                    category,
                }
                .into());
            }
            observed.push(frequencies.count(category).round());
            expected.push(exp);
        }

        let statistic = pearson_statistic(&observed, &expected);
        if !statistic.is_finite() {
            return Err(WeightingError::numerical(
                "chi-square",
                format!("statistic for '{variable}' is {statistic}"),
            ));
        }

        let df = expected.len().saturating_sub(1);
        let p_value = chi_square_sf(statistic, df)?;

        Ok(GoodnessOfFit {
            variable: variable.to_string(),
            statistic,
            df,
            p_value,
            consistent: p_value >= self.significance,
            observed,
            expected,
        })
    }
}

/// Sum of `(o - e)^2 / e`
pub fn pearson_statistic(observed: &[f64], expected: &[f64]) -> f64 {
    observed
        .iter()
        .zip(expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum()
}

/// Upper tail probability of the chi-square distribution.
///
/// A single category leaves no degrees of freedom; the fit is then exact by
/// construction and the p-value is 1.
pub fn chi_square_sf(statistic: f64, df: usize) -> Result<f64> {
    if df == 0 {
        return Ok(1.0);
    }
    let dist = ChiSquared::new(df as f64)
        .map_err(|e| WeightingError::numerical("chi-square", e.to_string()))?;
    Ok(dist.sf(statistic).clamp(0.0, 1.0))
}
