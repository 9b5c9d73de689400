//! Weighted descriptive tables
//!
//! Frequency and cross tables over raw category codes, optionally weighted
//! by a weight column. The missing-value code is not filtered out: it shows
//! up as a row of its own so the extent of item non-response stays visible.

use std::fmt;

use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use svy_core::data::{DataError, DataFrame};

use crate::base::Result;

/// Label of the margin row and column of a cross table
pub const MARGIN_LABEL: &str = "All";

/// Round half to even at `decimals` places
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Weight of every row: the named column, or 1.0 throughout
fn row_weights(df: &DataFrame, weight: Option<&str>) -> Result<Array1<f64>> {
    let Some(column) = weight else {
        return Ok(Array1::ones(df.nrows()));
    };
    let weights = df.column(column)?.to_float()?;
    if let Some(row) = weights.iter().position(|w| !w.is_finite()) {
        return Err(DataError::InvalidValue {
            column: column.to_string(),
            row,
            message: format!("weight {} is not finite", weights[row]),
        }
        .into());
    }
    Ok(weights)
}

/// One row of a frequency table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqRow {
    pub label: String,
    /// Weighted count, rounded to an integer
    pub num: f64,
    /// Weighted share, rounded to 2 decimals
    pub freq: f64,
}

/// Weighted frequency table of `var`, one row per code in ascending order
pub fn freq(df: &DataFrame, var: &str, weight: Option<&str>) -> Result<Vec<FreqRow>> {
    let codes = df.column(var)?.codes(var)?;
    let weights = row_weights(df, weight)?;

    let mut sums: IndexMap<i64, f64> = IndexMap::new();
    for (code, w) in codes.iter().zip(weights.iter()) {
        *sums.entry(*code).or_default() += w;
    }
    sums.sort_keys();

    let total = weights.sum();
    Ok(sums
        .into_iter()
        .map(|(code, sum)| FreqRow {
            label: code.to_string(),
            num: round_to(sum, 0),
            freq: if total != 0.0 { round_to(sum / total, 2) } else { 0.0 },
        })
        .collect())
}

/// Like [`freq`], with `labels` replacing the codes in row order.
///
/// There must be exactly one label per distinct code, the missing code
/// included.
pub fn freq_with_labels<S: AsRef<str>>(
    df: &DataFrame,
    var: &str,
    weight: Option<&str>,
    labels: &[S],
) -> Result<Vec<FreqRow>> {
    let mut rows = freq(df, var, weight)?;
    if labels.len() != rows.len() {
        return Err(DataError::DimensionMismatch {
            expected: format!("{} labels for '{var}'", rows.len()),
            actual: format!("{} labels", labels.len()),
        }
        .into());
    }
    for (row, label) in rows.iter_mut().zip(labels) {
        row.label = label.as_ref().to_string();
    }
    Ok(rows)
}

/// Direction of the shares in a cross table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentBy {
    /// Each cell over its row total
    #[default]
    Row,
    /// Each cell over its column total
    Column,
}

/// Weighted cross table with margins
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTable {
    pub row_variable: String,
    pub column_variable: String,
    /// Row codes in ascending order, then [`MARGIN_LABEL`]
    pub row_labels: Vec<String>,
    /// Column codes in ascending order, then [`MARGIN_LABEL`]
    pub column_labels: Vec<String>,
    /// Weighted counts including margins, rounded to integers
    pub counts: Array2<f64>,
    /// Row or column shares including margins, rounded to 2 decimals
    pub shares: Array2<f64>,
    pub percent_by: PercentBy,
}

impl CrossTable {
    /// Rounded count of a cell by labels
    pub fn count(&self, row: &str, column: &str) -> Option<f64> {
        let (i, j) = self.position(row, column)?;
        Some(self.counts[[i, j]])
    }

    /// Rounded share of a cell by labels
    pub fn share(&self, row: &str, column: &str) -> Option<f64> {
        let (i, j) = self.position(row, column)?;
        Some(self.shares[[i, j]])
    }

    fn position(&self, row: &str, column: &str) -> Option<(usize, usize)> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        let j = self.column_labels.iter().position(|l| l == column)?;
        Some((i, j))
    }
}

impl fmt::Display for CrossTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", format!("{}\\{}", self.row_variable, self.column_variable))?;
        for label in &self.column_labels {
            write!(f, " {label:>12}")?;
        }
        writeln!(f)?;

        for (i, label) in self.row_labels.iter().enumerate() {
            write!(f, "{label:>8}")?;
            for j in 0..self.column_labels.len() {
                let cell = format!("{} ({:.2})", self.counts[[i, j]], self.shares[[i, j]]);
                write!(f, " {cell:>12}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Weighted cross table of `row` by `column`
pub fn crosstab(
    df: &DataFrame,
    row: &str,
    column: &str,
    weight: Option<&str>,
    percent_by: PercentBy,
) -> Result<CrossTable> {
    let row_codes = df.column(row)?.codes(row)?;
    let column_codes = df.column(column)?.codes(column)?;
    let weights = row_weights(df, weight)?;

    let mut row_keys: Vec<i64> = row_codes.clone();
    row_keys.sort_unstable();
    row_keys.dedup();
    let mut column_keys: Vec<i64> = column_codes.clone();
    column_keys.sort_unstable();
    column_keys.dedup();

    let (nr, nc) = (row_keys.len(), column_keys.len());
    let mut sums = Array2::<f64>::zeros((nr + 1, nc + 1));
    for ((r, c), w) in row_codes.iter().zip(&column_codes).zip(weights.iter()) {
        // both searches succeed: the keys were collected from these codes
        let (Ok(i), Ok(j)) = (row_keys.binary_search(r), column_keys.binary_search(c)) else {
            continue;
        };
        sums[[i, j]] += w;
        sums[[i, nc]] += w;
        sums[[nr, j]] += w;
        sums[[nr, nc]] += w;
    }

    let mut shares = Array2::<f64>::zeros(sums.raw_dim());
    for ((i, j), share) in shares.indexed_iter_mut() {
        let base = match percent_by {
            PercentBy::Row => sums[[i, nc]],
            PercentBy::Column => sums[[nr, j]],
        };
        if base != 0.0 {
            *share = round_to(sums[[i, j]] / base, 2);
        }
    }

    let labels = |keys: &[i64]| {
        keys.iter()
            .map(i64::to_string)
            .chain(std::iter::once(MARGIN_LABEL.to_string()))
            .collect::<Vec<_>>()
    };

    Ok(CrossTable {
        row_variable: row.to_string(),
        column_variable: column.to_string(),
        row_labels: labels(&row_keys),
        column_labels: labels(&column_keys),
        counts: sums.mapv(|v| round_to(v, 0)),
        shares,
        percent_by,
    })
}
