//! Population reference tables
//!
//! A [`PopulationTable`] gives the target share of every category of one
//! control variable. A [`StratumTable`] maps composite sex/age/area keys to
//! the stratum group they belong to and that group's population share.
//! Both are immutable once built and validated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use svy_core::data::Category;

use crate::error::ConfigurationError;

/// Largest accepted deviation of a table's proportions from a total of 1.
///
/// Published population tables are usually rounded to a few decimals, so the
/// proportions are renormalised to sum to exactly 1 after this check.
pub const PROPORTION_TOLERANCE: f64 = 1e-3;

/// Target population distribution of one control variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPopulationTable")]
pub struct PopulationTable {
    variable: String,
    proportions: IndexMap<Category, f64>,
}

#[derive(Deserialize)]
struct RawPopulationTable {
    variable: String,
    proportions: IndexMap<Category, f64>,
}

impl TryFrom<RawPopulationTable> for PopulationTable {
    type Error = ConfigurationError;

    fn try_from(raw: RawPopulationTable) -> Result<Self, Self::Error> {
        Self::new(
            raw.variable,
            raw.proportions.into_iter().map(|(c, p)| (c.code(), p)),
        )
    }
}

impl PopulationTable {
    /// Build a table for the field `variable`.
    ///
    /// Proportions must be finite, non-negative and sum to 1 within
    /// [`PROPORTION_TOLERANCE`].
    pub fn new<S, I>(variable: S, proportions: I) -> Result<Self, ConfigurationError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (i64, f64)>,
    {
        let variable = variable.into();
        let mut table = IndexMap::new();

        for (code, proportion) in proportions {
            let category = Category::new(code);
            if !proportion.is_finite() || proportion < 0.0 {
                return Err(ConfigurationError::invalid_reference(
                    &variable,
                    format!("proportion {proportion} for category {category}"),
                ));
            }
            if table.insert(category, proportion).is_some() {
                return Err(ConfigurationError::invalid_reference(
                    &variable,
                    format!("category {category} listed twice"),
                ));
            }
        }

        if table.is_empty() {
            return Err(ConfigurationError::invalid_reference(
                &variable,
                "no categories",
            ));
        }

        let total: f64 = table.values().sum();
        if (total - 1.0).abs() > PROPORTION_TOLERANCE {
            return Err(ConfigurationError::invalid_reference(
                &variable,
                format!("proportions sum to {total}, expected 1"),
            ));
        }
        table.values_mut().for_each(|p| *p /= total);

        Ok(Self {
            variable,
            proportions: table,
        })
    }

    /// Name of the field this table controls
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Target proportion of a category, if the table lists it
    pub fn proportion(&self, category: Category) -> Option<f64> {
        self.proportions.get(&category).copied()
    }

    /// Categories in table order
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.proportions.keys().copied()
    }

    /// `(category, proportion)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.proportions.iter().map(|(&c, &p)| (c, p))
    }

    pub fn contains(&self, category: Category) -> bool {
        self.proportions.contains_key(&category)
    }

    pub fn len(&self) -> usize {
        self.proportions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proportions.is_empty()
    }
}

/// Stratum group and population share for one composite key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StratumEntry {
    pub group: i64,
    pub ratio: f64,
}

/// Lookup from composite stratum key to stratum group.
///
/// Keys are the concatenated sex, age and area codes as text and keep their
/// leading zeros: sex 0, age 1, area 3 is `"013"`. Tables keyed by the
/// integer value (`"13"`) need [`StratumAssigner::numeric_keys`].
///
/// [`StratumAssigner::numeric_keys`]: crate::strata::StratumAssigner::numeric_keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, StratumEntry>", into = "IndexMap<String, StratumEntry>")]
pub struct StratumTable {
    entries: IndexMap<String, StratumEntry>,
    group_ratios: IndexMap<i64, f64>,
}

impl TryFrom<IndexMap<String, StratumEntry>> for StratumTable {
    type Error = ConfigurationError;

    fn try_from(entries: IndexMap<String, StratumEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<StratumTable> for IndexMap<String, StratumEntry> {
    fn from(table: StratumTable) -> Self {
        table.entries
    }
}

impl StratumTable {
    /// Build a stratum table.
    ///
    /// Several keys may share a group, but they must agree on its ratio.
    pub fn new<I, K>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, StratumEntry)>,
        K: Into<String>,
    {
        let mut table = IndexMap::new();
        let mut group_ratios: IndexMap<i64, f64> = IndexMap::new();

        for (key, entry) in entries {
            let key = key.into();
            if !entry.ratio.is_finite() || entry.ratio <= 0.0 {
                return Err(ConfigurationError::invalid_reference(
                    "strata",
                    format!("ratio {} for key '{key}'", entry.ratio),
                ));
            }
            match group_ratios.get(&entry.group) {
                Some(&ratio) if (ratio - entry.ratio).abs() > f64::EPSILON => {
                    return Err(ConfigurationError::invalid_reference(
                        "strata",
                        format!(
                            "group {} has ratios {ratio} and {} (key '{key}')",
                            entry.group, entry.ratio
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    group_ratios.insert(entry.group, entry.ratio);
                }
            }
            if table.insert(key.clone(), entry).is_some() {
                return Err(ConfigurationError::invalid_reference(
                    "strata",
                    format!("key '{key}' listed twice"),
                ));
            }
        }

        Ok(Self {
            entries: table,
            group_ratios,
        })
    }

    /// Entry for a composite key
    pub fn get(&self, key: &str) -> Option<&StratumEntry> {
        self.entries.get(key)
    }

    /// Population ratio of a stratum group
    pub fn group_ratio(&self, group: i64) -> Option<f64> {
        self.group_ratios.get(&group).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The full population reference for a weighting run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    controls: IndexMap<String, PopulationTable>,
    strata: Option<StratumTable>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the reference table of one control variable
    pub fn with_control(mut self, table: PopulationTable) -> Result<Self, ConfigurationError> {
        let name = table.variable().to_string();
        if self.controls.contains_key(&name) {
            return Err(ConfigurationError::DuplicateControl(name));
        }
        self.controls.insert(name, table);
        Ok(self)
    }

    /// Set the stratum table used by post-stratification
    pub fn with_strata(mut self, strata: StratumTable) -> Self {
        self.strata = Some(strata);
        self
    }

    /// Reference table of a control variable
    pub fn control(&self, variable: &str) -> Result<&PopulationTable, ConfigurationError> {
        self.controls
            .get(variable)
            .ok_or_else(|| ConfigurationError::MissingReference(variable.to_string()))
    }

    pub fn controls(&self) -> impl Iterator<Item = &PopulationTable> {
        self.controls.values()
    }

    pub fn strata(&self) -> Result<&StratumTable, ConfigurationError> {
        self.strata
            .as_ref()
            .ok_or_else(|| ConfigurationError::MissingReference("strata".to_string()))
    }
}
