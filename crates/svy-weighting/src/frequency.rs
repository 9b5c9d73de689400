//! Weighted frequency estimation
//!
//! Observed weighted counts per category of one field. Both the chi-square
//! check and the rescale step read the current weights through here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use svy_core::data::Category;

use crate::base::Result;
use crate::error::ConfigurationError;
use crate::population::PopulationTable;
use crate::store::WeightStore;

/// Weighted count and share of one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryFrequency {
    /// Sum of weights of the records holding the category
    pub count: f64,
    /// `count` over the total weight of records with a valid value
    pub proportion: f64,
}

/// Weighted distribution of one field over its valid categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub variable: String,
    pub entries: IndexMap<Category, CategoryFrequency>,
    /// Total weight over records with a valid value
    pub total: f64,
}

impl FrequencyTable {
    /// Estimate the weighted distribution of `field` from the current weights.
    ///
    /// With a `reference`, entries follow the reference order and every
    /// reference category is present, with a zero count if unobserved; a
    /// category observed in the data but absent from the reference is a
    /// configuration error. Without one, observed categories are listed in
    /// ascending code order.
    pub fn estimate(
        store: &WeightStore,
        field: &str,
        reference: Option<&PopulationTable>,
    ) -> Result<Self> {
        let values = store.field(field)?;

        let mut counts: IndexMap<Category, f64> = match reference {
            Some(table) => table.categories().map(|c| (c, 0.0)).collect(),
            None => IndexMap::new(),
        };

        for (value, &w) in values.iter().zip(store.weights().iter()) {
            let Some(category) = value else { continue };
            match counts.get_mut(category) {
                Some(count) => *count += w,
                None if reference.is_some() => {
                    return Err(ConfigurationError::UnmappedCategory {
                        variable: field.to_string(),
                        category: *category,
                    }
                    .into());
                }
                None => {
                    counts.insert(*category, w);
                }
            }
        }

        if reference.is_none() {
            counts.sort_keys();
        }

        let total: f64 = counts.values().sum();
        let entries = counts
            .into_iter()
            .map(|(category, count)| {
                let proportion = if total > 0.0 { count / total } else { 0.0 };
                (category, CategoryFrequency { count, proportion })
            })
            .collect();

        Ok(Self {
            variable: field.to_string(),
            entries,
            total,
        })
    }

    /// Weighted count of a category, zero if not listed
    pub fn count(&self, category: Category) -> f64 {
        self.entries.get(&category).map_or(0.0, |e| e.count)
    }

    /// Weighted share of a category, zero if not listed
    pub fn proportion(&self, category: Category) -> f64 {
        self.entries.get(&category).map_or(0.0, |e| e.proportion)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryFrequency)> {
        self.entries.iter().map(|(&c, e)| (c, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests;
