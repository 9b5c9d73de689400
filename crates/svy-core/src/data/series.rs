//! Series data structure for holding homogeneous data
//!
//! A Series is a one-dimensional typed column. Survey files arrive with
//! categorical answers stored as integer codes and weights stored as floats,
//! so those are the two shapes the weighting code decodes from.

use super::*;

/// A Series is a typed, one-dimensional array of data
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// Floating point numbers (f64)
    Float(FloatArray),
    /// Integer numbers (i64)
    Int(IntArray),
    /// String values
    String(StringArray),
}

impl Series {
    /// Create a new Float series
    pub fn float(data: impl Into<FloatArray>) -> Self {
        Series::Float(data.into())
    }

    /// Create a new Int series
    pub fn int(data: impl Into<IntArray>) -> Self {
        Series::Int(data.into())
    }

    /// Create a new String series
    pub fn string(data: impl Into<StringArray>) -> Self {
        Series::String(data.into())
    }

    /// Create an Int series from optional categories, writing `sentinel` for `None`
    pub fn from_categories(data: &[Option<Category>], sentinel: i64) -> Self {
        Series::Int(
            data.iter()
                .map(|c| c.map_or(sentinel, Category::code))
                .collect(),
        )
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        match self {
            Series::Float(arr) => arr.len(),
            Series::Int(arr) => arr.len(),
            Series::String(arr) => arr.len(),
        }
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the type name of the series
    pub fn dtype(&self) -> &'static str {
        match self {
            Series::Float(_) => "float64",
            Series::Int(_) => "int64",
            Series::String(_) => "string",
        }
    }

    /// Numeric values as floats
    pub fn to_float(&self) -> Result<FloatArray> {
        match self {
            Series::Float(arr) => Ok(arr.clone()),
            Series::Int(arr) => Ok(arr.mapv(|v| v as f64)),
            Series::String(_) => Err(DataError::NonNumericData("string")),
        }
    }

    /// Raw integer codes of the series.
    ///
    /// Float columns are accepted when every value is integral, which is how
    /// spreadsheet exports often store codes.
    pub fn codes(&self, column: &str) -> Result<Vec<i64>> {
        match self {
            Series::Int(arr) => Ok(arr.to_vec()),
            Series::Float(arr) => arr
                .iter()
                .enumerate()
                .map(|(row, &v)| {
                    if v.is_finite() && v.fract() == 0.0 {
                        Ok(v as i64)
                    } else {
                        Err(DataError::InvalidValue {
                            column: column.to_string(),
                            row,
                            message: format!("{v} is not an integer category code"),
                        })
                    }
                })
                .collect(),
            Series::String(_) => Err(DataError::TypeMismatch {
                column: column.to_string(),
                expected: "int64",
                actual: "string",
            }),
        }
    }

    /// Decode the series as categorical codes, mapping `sentinel` to `None`.
    pub fn categories(&self, column: &str, sentinel: i64) -> Result<Vec<Option<Category>>> {
        Ok(self
            .codes(column)?
            .into_iter()
            .map(|code| Category::from_code(code, sentinel))
            .collect())
    }

    /// Compute sum
    pub fn sum(&self) -> Result<f64> {
        match self {
            Series::Float(arr) => Ok(arr.sum()),
            Series::Int(arr) => Ok(arr.iter().map(|&v| v as f64).sum()),
            Series::String(_) => Err(DataError::NonNumericData("string")),
        }
    }
}
