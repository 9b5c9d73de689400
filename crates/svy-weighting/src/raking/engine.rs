//! Raking engine

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::base::{Result, WeightingMethod};
use crate::error::ConfigurationError;
use crate::frequency::FrequencyTable;
use crate::goodness_of_fit::{ChiSquareTest, GoodnessOfFit};
use crate::population::{Population, PopulationTable};
use crate::raking::{RakingConfig, RakingOutcome, RakingReport, RakingState};
use crate::rescale::rescale;
use crate::store::WeightStore;

/// Iterative proportional fitting over an ordered list of control variables
#[derive(Debug, Clone)]
pub struct RakingEngine {
    controls: Vec<PopulationTable>,
    config: RakingConfig,
    test: ChiSquareTest,
}

impl RakingEngine {
    /// Create an engine over `controls`, checked in the given priority order
    pub fn new(controls: Vec<PopulationTable>, config: RakingConfig) -> Result<Self> {
        config.validate()?;
        let test = ChiSquareTest::new(config.significance)?;

        if controls.is_empty() {
            return Err(ConfigurationError::invalid_config("no control variables").into());
        }
        let mut seen = HashSet::new();
        for table in &controls {
            if !seen.insert(table.variable()) {
                return Err(ConfigurationError::DuplicateControl(table.variable().to_string()).into());
            }
        }

        Ok(Self {
            controls,
            config,
            test,
        })
    }

    /// Create an engine over the named controls of `population`, in `order`
    pub fn from_population<S: AsRef<str>>(
        population: &Population,
        order: &[S],
        config: RakingConfig,
    ) -> Result<Self> {
        let controls = order
            .iter()
            .map(|name| population.control(name.as_ref()).cloned())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::new(controls, config)
    }

    pub fn controls(&self) -> &[PopulationTable] {
        &self.controls
    }

    pub fn config(&self) -> &RakingConfig {
        &self.config
    }

    /// Goodness of fit of every control variable, in priority order
    pub fn check(&self, store: &WeightStore) -> Result<Vec<GoodnessOfFit>> {
        self.controls
            .iter()
            .map(|table| self.test.check(store, table))
            .collect()
    }

    /// Advance a run by one transition.
    ///
    /// `report` accumulates the pass count, the latest p-values and the
    /// sequence of adjusted variables. Terminal states are returned as is.
    pub fn step(
        &self,
        state: RakingState,
        store: &mut WeightStore,
        report: &mut RakingReport,
    ) -> Result<RakingState> {
        match state {
            RakingState::Checking => {
                let fits = self.check(store)?;
                report.p_values = fits
                    .iter()
                    .map(|fit| (fit.variable.clone(), fit.p_value))
                    .collect();

                let Some(variable) = fits.iter().position(|fit| !fit.consistent) else {
                    return Ok(RakingState::Converged);
                };
                debug!(
                    "pass {}: '{}' inconsistent (chi2 = {:.4}, p = {:.4})",
                    report.passes, fits[variable].variable, fits[variable].statistic, fits[variable].p_value
                );

                if report.passes >= self.config.max_passes {
                    Ok(RakingState::Failed)
                } else {
                    Ok(RakingState::Adjusting { variable })
                }
            }
            RakingState::Adjusting { variable } => {
                let table = self.controls.get(variable).ok_or_else(|| {
                    ConfigurationError::invalid_config(format!("no control variable at {variable}"))
                })?;
                let outcome = rescale(store, table)?;
                report.passes += 1;
                report.adjusted.push(outcome.variable);
                Ok(RakingState::Checking)
            }
            RakingState::Converged | RakingState::Failed => Ok(state),
        }
    }

    /// Rake `store` until every control variable passes or the pass cap is reached
    pub fn run(&self, store: &mut WeightStore) -> Result<RakingOutcome> {
        self.validate(store)?;

        let mut report = RakingReport {
            passes: 0,
            p_values: Default::default(),
            adjusted: Vec::new(),
        };
        let mut state = RakingState::Checking;
        while !state.is_terminal() {
            state = self.step(state, store, &mut report)?;
        }

        if state == RakingState::Converged {
            info!("raking converged after {} passes", report.passes);
            Ok(RakingOutcome::Converged(report))
        } else {
            warn!(
                "raking stopped at the cap of {} passes without converging: {:?}",
                self.config.max_passes, report.p_values
            );
            Ok(RakingOutcome::Failed(report))
        }
    }
}

impl WeightingMethod for RakingEngine {
    type Output = RakingOutcome;

    /// Every control field must exist, and its observed categories must match
    /// its reference categories exactly.
    fn validate(&self, store: &WeightStore) -> Result<()> {
        for table in &self.controls {
            let frequencies = FrequencyTable::estimate(store, table.variable(), Some(table))?;
            let unobserved = frequencies
                .iter()
                .find(|(_, f)| f.count <= 0.0)
                .map(|(category, _)| category);
            if let Some(category) = unobserved {
                return Err(ConfigurationError::UnobservedCategory {
                    variable: table.variable().to_string(),
                    category,
                }
                .into());
            }
        }
        Ok(())
    }

    fn apply(&self, store: &mut WeightStore) -> Result<RakingOutcome> {
        self.run(store)
    }
}
