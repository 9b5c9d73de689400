//! Weighting jobs over a respondent frame
//!
//! [`Weighting`] owns a copy of the respondent frame and the population
//! reference. Each job extracts a [`WeightStore`], runs one weighting method
//! on it and returns a new frame with the weight column written back.

use log::info;
use serde::{Deserialize, Serialize};

use svy_core::data::{DataFrame, Series, MISSING_CODE};

use crate::base::{Result, WeightingMethod};
use crate::population::Population;
use crate::raking::{RakingConfig, RakingEngine, RakingOutcome, DEFAULT_CONTROLS};
use crate::strata::{PostStratification, PostStratifier, StratumAssigner};
use crate::store::WeightStore;

/// Column names and engine settings of a weighting job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Column the weights are read from and written to
    pub weight_column: String,
    /// Column the stratum group of each record is written to
    pub strata_column: String,
    /// Code that marks a missing answer
    pub sentinel: i64,
    pub raking: RakingConfig,
    /// Control variables in priority order
    pub controls: Vec<String>,
    /// Fields the stratum key is built from
    pub stratum_fields: StratumAssigner,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            weight_column: "weight".to_string(),
            strata_column: "strata".to_string(),
            sentinel: MISSING_CODE,
            raking: RakingConfig::default(),
            controls: DEFAULT_CONTROLS.iter().map(|c| c.to_string()).collect(),
            stratum_fields: StratumAssigner::default(),
        }
    }
}

impl WeightingConfig {
    pub fn with_weight_column(mut self, name: impl Into<String>) -> Self {
        self.weight_column = name.into();
        self
    }

    pub fn with_strata_column(mut self, name: impl Into<String>) -> Self {
        self.strata_column = name.into();
        self
    }

    pub fn with_sentinel(mut self, sentinel: i64) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn with_raking(mut self, raking: RakingConfig) -> Self {
        self.raking = raking;
        self
    }

    pub fn with_controls<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controls = controls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stratum_fields(mut self, fields: StratumAssigner) -> Self {
        self.stratum_fields = fields;
        self
    }
}

/// A respondent frame paired with its population reference
#[derive(Debug, Clone)]
pub struct Weighting {
    df: DataFrame,
    population: Population,
    config: WeightingConfig,
}

impl Weighting {
    pub fn new(df: DataFrame, population: Population) -> Self {
        Self {
            df,
            population,
            config: WeightingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WeightingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn data(&self) -> &DataFrame {
        &self.df
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn config(&self) -> &WeightingConfig {
        &self.config
    }

    /// Post-stratify the frame.
    ///
    /// Returns a copy of the frame with the weight column and the strata
    /// column set. Existing weights are ignored and overwritten.
    pub fn post_stratification(&self) -> Result<DataFrame> {
        let (df, _) = self.post_stratify()?;
        Ok(df)
    }

    /// Like [`Weighting::post_stratification`], also returning the group
    /// assignment
    pub fn post_stratify(&self) -> Result<(DataFrame, PostStratification)> {
        let method = PostStratifier::new(self.population.strata()?.clone())
            .with_assigner(self.config.stratum_fields.clone());

        let mut store = WeightStore::uniform(self.df.nrows());
        for name in method.assigner().fields() {
            let values = self.df.column(name)?.categories(name, self.config.sentinel)?;
            store = store.with_field(name, values)?;
        }

        let outcome = method.apply(&mut store)?;

        let mut df = self.df.clone();
        store.write_back(&mut df, &self.config.weight_column)?;
        df.set_column(
            self.config.strata_column.as_str(),
            Series::int(outcome.strata.clone()),
        )?;
        Ok((df, outcome))
    }

    /// Rake the frame against the configured control variables.
    ///
    /// Starts from the frame's weight column when present, so a
    /// post-stratified frame can be raked further, and from 1.0 otherwise.
    /// Returns the reweighted copy of the frame and the run outcome; a run
    /// that hits the pass cap still returns the weights it reached.
    pub fn raking(&self) -> Result<(DataFrame, RakingOutcome)> {
        let engine =
            RakingEngine::from_population(&self.population, &self.config.controls, self.config.raking)?;
        let mut store = WeightStore::from_frame(
            &self.df,
            &self.config.controls,
            &self.config.weight_column,
            self.config.sentinel,
        )?;

        let outcome = engine.apply(&mut store)?;
        info!(
            "raked {} respondents over {:?}: {:?} after {} passes",
            store.len(),
            self.config.controls,
            outcome.state(),
            outcome.passes()
        );

        let mut df = self.df.clone();
        store.write_back(&mut df, &self.config.weight_column)?;
        Ok((df, outcome))
    }
}

#[cfg(test)]
mod tests;
