//! Post-stratification
//!
//! Each respondent is placed in a stratum from its sex, age and area
//! categories, then given the weight `ratio * n / n_group`, where `ratio` is
//! the stratum group's population share and `n_group` the number of
//! respondents in the group. One pass, no iteration.

use indexmap::IndexMap;
use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use svy_core::data::Category;

use crate::base::{Result, WeightingMethod};
use crate::error::{ConfigurationError, WeightingError};
use crate::population::StratumTable;
use crate::raking::{AGE, AREA, SEX};
use crate::store::WeightStore;

/// Builds composite stratum keys and resolves them to stratum groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratumAssigner {
    pub sex: String,
    pub age: String,
    pub area: String,
    /// Read keys as numbers, dropping leading zeros, so `"013"` looks up
    /// `"13"`. Matches stratum tables exported with an integer index.
    #[serde(default)]
    pub numeric_keys: bool,
}

impl Default for StratumAssigner {
    fn default() -> Self {
        Self {
            sex: SEX.to_string(),
            age: AGE.to_string(),
            area: AREA.to_string(),
            numeric_keys: false,
        }
    }
}

impl StratumAssigner {
    pub fn new(sex: impl Into<String>, age: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            sex: sex.into(),
            age: age.into(),
            area: area.into(),
            numeric_keys: false,
        }
    }

    pub fn with_numeric_keys(mut self, numeric_keys: bool) -> Self {
        self.numeric_keys = numeric_keys;
        self
    }

    /// Field names in key order
    pub fn fields(&self) -> [&str; 3] {
        [self.sex.as_str(), self.age.as_str(), self.area.as_str()]
    }

    /// Concatenated category codes; a missing value contributes nothing
    pub fn key(sex: Option<Category>, age: Option<Category>, area: Option<Category>) -> String {
        [sex, age, area]
            .into_iter()
            .flatten()
            .map(|c| c.to_string())
            .collect()
    }

    /// Key of one record as looked up in the stratum table
    pub fn lookup_key(
        &self,
        sex: Option<Category>,
        age: Option<Category>,
        area: Option<Category>,
    ) -> String {
        let key = Self::key(sex, age, area);
        if !self.numeric_keys {
            return key;
        }
        match key.trim_start_matches('0') {
            "" if !key.is_empty() => "0".to_string(),
            trimmed => trimmed.to_string(),
        }
    }

    /// Stratum group of every record, in record order.
    ///
    /// A key absent from `table` is an error naming the first such row.
    pub fn assign(&self, store: &WeightStore, table: &StratumTable) -> Result<Vec<i64>> {
        let sex = store.field(&self.sex)?;
        let age = store.field(&self.age)?;
        let area = store.field(&self.area)?;

        (0..store.len())
            .map(|row| {
                let key = self.lookup_key(sex[row], age[row], area[row]);
                table
                    .get(&key)
                    .map(|entry| entry.group)
                    .ok_or_else(|| WeightingError::from(ConfigurationError::UnmatchedStratum { row, key }))
            })
            .collect()
    }
}

/// What post-stratification did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostStratification {
    /// Stratum group of every record
    pub strata: Vec<i64>,
    /// Number of respondents per group, in first-seen order
    pub group_sizes: IndexMap<i64, usize>,
}

/// One-shot post-stratification against a stratum table
#[derive(Debug, Clone, PartialEq)]
pub struct PostStratifier {
    assigner: StratumAssigner,
    table: StratumTable,
}

impl PostStratifier {
    pub fn new(table: StratumTable) -> Self {
        Self {
            assigner: StratumAssigner::default(),
            table,
        }
    }

    pub fn with_assigner(mut self, assigner: StratumAssigner) -> Self {
        self.assigner = assigner;
        self
    }

    pub fn assigner(&self) -> &StratumAssigner {
        &self.assigner
    }

    pub fn table(&self) -> &StratumTable {
        &self.table
    }
}

impl WeightingMethod for PostStratifier {
    type Output = PostStratification;

    fn validate(&self, store: &WeightStore) -> Result<()> {
        self.assigner.assign(store, &self.table).map(|_| ())
    }

    fn apply(&self, store: &mut WeightStore) -> Result<PostStratification> {
        let strata = self.assigner.assign(store, &self.table)?;

        let mut group_sizes: IndexMap<i64, usize> = IndexMap::new();
        for &group in &strata {
            *group_sizes.entry(group).or_default() += 1;
        }

        let n = store.len() as f64;
        let weights = strata
            .iter()
            .map(|group| -> Result<f64> {
                let ratio = self.table.group_ratio(*group).ok_or_else(|| {
                    WeightingError::numerical("post-stratification", format!("group {group} has no ratio"))
                })?;
                Ok(ratio * n / group_sizes[group] as f64)
            })
            .collect::<Result<Array1<f64>>>()?;

        for (group, size) in &group_sizes {
            debug!("stratum group {group}: {size} respondents");
        }
        store.set_weights(weights)?;
        info!(
            "post-stratified {} respondents into {} groups",
            store.len(),
            group_sizes.len()
        );

        Ok(PostStratification {
            strata,
            group_sizes,
        })
    }
}
