//! Per-respondent weight state
//!
//! The [`WeightStore`] owns an exclusive copy of the categorical fields a
//! weighting run reads and the weight vector it mutates. Every mutation is a
//! whole-vector operation that leaves all weights finite and strictly
//! positive, or fails without touching the vector.

use indexmap::IndexMap;
use ndarray::Array1;

use svy_core::data::{Category, DataError, DataFrame, Series};

use crate::base::Result;
use crate::error::{ConfigurationError, WeightingError};

/// Categorical fields and weights of the respondents in one weighting run
#[derive(Debug, Clone, PartialEq)]
pub struct WeightStore {
    fields: IndexMap<String, Vec<Option<Category>>>,
    weights: Array1<f64>,
}

impl WeightStore {
    /// Store for `n` respondents with uniform weight 1 and no fields yet
    pub fn uniform(n: usize) -> Self {
        Self {
            fields: IndexMap::new(),
            weights: Array1::ones(n),
        }
    }

    /// Store with the given starting weights
    pub fn with_weights(weights: Array1<f64>) -> Result<Self> {
        check_weights(&weights, "weights")?;
        Ok(Self {
            fields: IndexMap::new(),
            weights,
        })
    }

    /// Extract `fields` and the weight column from a frame.
    ///
    /// Each field is decoded with `sentinel` meaning "missing". The weight
    /// column starts at 1.0 when the frame does not have one.
    pub fn from_frame<S: AsRef<str>>(
        df: &DataFrame,
        fields: &[S],
        weight_column: &str,
        sentinel: i64,
    ) -> Result<Self> {
        let mut store = match df.get_column(weight_column) {
            Some(series) => {
                let weights = series.to_float().map_err(|_| DataError::TypeMismatch {
                    column: weight_column.to_string(),
                    expected: "float64",
                    actual: series.dtype(),
                })?;
                if let Some(row) = weights.iter().position(|w| !w.is_finite() || *w <= 0.0) {
                    return Err(DataError::InvalidValue {
                        column: weight_column.to_string(),
                        row,
                        message: format!("weight {} is not strictly positive", weights[row]),
                    }
                    .into());
                }
                Self::with_weights(weights)?
            }
            None => Self::uniform(df.nrows()),
        };

        for name in fields {
            let name = name.as_ref();
            if store.fields.contains_key(name) {
                continue;
            }
            let values = df.column(name)?.categories(name, sentinel)?;
            store = store.with_field(name, values)?;
        }

        Ok(store)
    }

    /// Add a decoded categorical field
    pub fn with_field<S: Into<String>>(
        mut self,
        name: S,
        values: Vec<Option<Category>>,
    ) -> Result<Self> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} rows", self.len()),
                actual: format!("{} rows in '{name}'", values.len()),
            }
            .into());
        }
        if self.fields.contains_key(&name) {
            return Err(DataError::DuplicateColumn(name).into());
        }
        self.fields.insert(name, values);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.sum()
    }

    /// Decoded values of a field
    pub fn field(&self, name: &str) -> Result<&[Option<Category>]> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()).into())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Total weight of the records with a valid value for `field`
    pub fn valid_mass(&self, field: &str) -> Result<f64> {
        Ok(self
            .field(field)?
            .iter()
            .zip(self.weights.iter())
            .filter(|(value, _)| value.is_some())
            .map(|(_, w)| w)
            .sum())
    }

    /// Multiply by `factor` the weight of every record whose value of
    /// `field` satisfies `predicate`. Missing values never match.
    pub fn rescale_where<P>(&mut self, field: &str, predicate: P, factor: f64) -> Result<usize>
    where
        P: Fn(Category) -> bool,
    {
        check_factor(factor, field)?;
        let values = self
            .fields
            .get(field)
            .ok_or_else(|| DataError::ColumnNotFound(field.to_string()))?;

        let mut touched = 0;
        for (w, value) in self.weights.iter_mut().zip(values) {
            if value.is_some_and(&predicate) {
                *w *= factor;
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Multiply each record's weight by the factor of its category of `field`.
    ///
    /// Records are grouped by category and each group is scaled in one
    /// sweep. Records missing `field` are left as they are. Every observed
    /// category needs a factor.
    pub fn rescale_by_category(
        &mut self,
        field: &str,
        factors: &IndexMap<Category, f64>,
    ) -> Result<()> {
        let mut plan = Vec::new();
        for (category, members) in self.groups(field)? {
            let factor = factors.get(&category).copied().ok_or_else(|| {
                ConfigurationError::UnmappedCategory {
                    variable: field.to_string(),
                    category,
                }
            })?;
            check_factor(factor, field)?;
            plan.push((factor, members));
        }

        let mut next = self.weights.clone();
        for (factor, members) in plan {
            for idx in members {
                next[idx] *= factor;
            }
        }

        check_weights(&next, field)?;
        self.weights = next;
        Ok(())
    }

    /// Record positions grouped by category of `field`, in first-seen order
    pub fn groups(&self, field: &str) -> Result<IndexMap<Category, Vec<usize>>> {
        let mut groups: IndexMap<Category, Vec<usize>> = IndexMap::new();
        for (idx, value) in self.field(field)?.iter().enumerate() {
            if let Some(category) = value {
                groups.entry(*category).or_default().push(idx);
            }
        }
        Ok(groups)
    }

    /// Replace the whole weight vector
    pub fn set_weights(&mut self, weights: Array1<f64>) -> Result<()> {
        if weights.len() != self.len() {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} weights", self.len()),
                actual: format!("{} weights", weights.len()),
            }
            .into());
        }
        check_weights(&weights, "weights")?;
        self.weights = weights;
        Ok(())
    }

    /// Write the weights into `weight_column` of `df`, replacing any existing column
    pub fn write_back(&self, df: &mut DataFrame, weight_column: &str) -> Result<()> {
        df.set_column(weight_column, Series::float(self.weights.clone()))?;
        Ok(())
    }
}

fn check_factor(factor: f64, field: &str) -> Result<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(WeightingError::numerical(
            "rescale",
            format!("factor {factor} for '{field}' is not strictly positive"),
        ))
    }
}

fn check_weights(weights: &Array1<f64>, context: &str) -> Result<()> {
    match weights.iter().position(|w| !w.is_finite() || *w <= 0.0) {
        None => Ok(()),
        Some(row) => Err(WeightingError::numerical(
            "rescale",
            format!(
                "weight {} of row {row} after '{context}' is not strictly positive",
                weights[row]
            ),
        )),
    }
}
