//! DataFrame implementation for respondent records
//!
//! A DataFrame is a 2-dimensional labeled data structure with columns of
//! potentially different types. Column order is preserved so that a frame
//! written back out keeps the layout it was read with.

use super::*;

use indexmap::IndexMap;

/// Main DataFrame structure
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataFrame {
    pub(crate) columns: IndexMap<String, Series>,
    pub(crate) nrows: usize,
}

impl DataFrame {
    /// Get the number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Get the number of columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Get a reference to a column
    pub fn get_column(&self, name: &str) -> Option<&Series> {
        self.columns.get(name)
    }

    /// Get a column or fail with [`DataError::ColumnNotFound`]
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Add a new column
    pub fn with_column<S: Into<String>>(mut self, name: S, series: Series) -> Result<Self> {
        let name = name.into();

        if self.columns.contains_key(&name) {
            return Err(DataError::DuplicateColumn(name));
        }

        self.check_len(&series)?;
        if self.columns.is_empty() {
            self.nrows = series.len();
        }

        self.columns.insert(name, series);
        Ok(self)
    }

    /// Replace an existing column in place or append a new one
    pub fn set_column<S: Into<String>>(&mut self, name: S, series: Series) -> Result<&mut Self> {
        self.check_len(&series)?;
        if self.columns.is_empty() {
            self.nrows = series.len();
        }

        self.columns.insert(name.into(), series);
        Ok(self)
    }

    fn check_len(&self, series: &Series) -> Result<()> {
        if !self.columns.is_empty() && series.len() != self.nrows {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} rows", self.nrows),
                actual: format!("{} rows", series.len()),
            });
        }
        Ok(())
    }
}
