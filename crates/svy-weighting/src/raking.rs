//! Raking (iterative proportional fitting)
//!
//! The engine repeatedly checks every control variable with a chi-square
//! goodness-of-fit test and rescales the first variable found inconsistent,
//! until all variables pass or the pass cap is reached.
//!
//! The run is an explicit state machine:
//!
//! ```text
//! Checking --all consistent--------------> Converged
//! Checking --inconsistent, passes < cap--> Adjusting { variable }
//! Checking --inconsistent, passes = cap--> Failed
//! Adjusting ----------rescale, passes+1--> Checking
//! ```

pub mod engine;


pub use engine::RakingEngine;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::base::Result;
use crate::error::ConfigurationError;
use crate::goodness_of_fit::DEFAULT_SIGNIFICANCE;

/// Field names of the default control variables
pub const SEX: &str = "SEX";
pub const AGE: &str = "AGE";
pub const EDU: &str = "EDU";
pub const AREA: &str = "AREA";

/// Default priority order of control variables
pub const DEFAULT_CONTROLS: [&str; 4] = [SEX, AGE, EDU, AREA];

/// Default cap on rescale passes
pub const DEFAULT_MAX_PASSES: usize = 100;

/// Raking engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RakingConfig {
    /// Maximum number of rescale passes before giving up
    pub max_passes: usize,
    /// Significance level of the chi-square check
    pub significance: f64,
}

impl Default for RakingConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

impl RakingConfig {
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ConfigurationError::invalid_config(format!(
                "significance {} is outside (0, 1)",
                self.significance
            ))
            .into());
        }
        Ok(())
    }
}

/// State of a raking run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RakingState {
    /// Checking every control variable against its reference
    Checking,
    /// About to rescale the control variable at this position
    Adjusting { variable: usize },
    /// Every control variable passed
    Converged,
    /// The pass cap was reached with a variable still failing
    Failed,
}

impl RakingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RakingState::Converged | RakingState::Failed)
    }
}

/// Diagnostics of a finished raking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RakingReport {
    /// Number of rescale passes performed
    pub passes: usize,
    /// Last p-value of every control variable, in priority order
    pub p_values: IndexMap<String, f64>,
    /// Variable rescaled by each pass, in order
    pub adjusted: Vec<String>,
}

/// Terminal outcome of a raking run.
///
/// Failing to converge is not an error: the weights reached so far stay in
/// the store and the caller decides whether to keep them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RakingOutcome {
    Converged(RakingReport),
    Failed(RakingReport),
}

impl RakingOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, RakingOutcome::Converged(_))
    }

    pub fn state(&self) -> RakingState {
        match self {
            RakingOutcome::Converged(_) => RakingState::Converged,
            RakingOutcome::Failed(_) => RakingState::Failed,
        }
    }

    pub fn report(&self) -> &RakingReport {
        match self {
            RakingOutcome::Converged(report) | RakingOutcome::Failed(report) => report,
        }
    }

    pub fn into_report(self) -> RakingReport {
        match self {
            RakingOutcome::Converged(report) | RakingOutcome::Failed(report) => report,
        }
    }

    pub fn passes(&self) -> usize {
        self.report().passes
    }
}
