//! Core data structures for survey records
//!
//! This module provides the tabular containers the weighting subsystem
//! consumes: typed columns ([`Series`]), an ordered collection of columns
//! ([`DataFrame`]) and the explicit categorical code type ([`Category`]).

mod builder;
mod category;
mod dataframe;
mod series;


// Re-exports
pub use builder::DataFrameBuilder;
pub use category::{Category, MISSING_CODE};
pub use dataframe::DataFrame;
pub use series::Series;

// Type aliases for common use cases
pub type FloatArray = ndarray::Array1<f64>;
pub type IntArray = ndarray::Array1<i64>;
pub type StringArray = Vec<String>;

/// Error types specific to data operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Invalid column type for '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Operation requires numeric data, got {0}")]
    NonNumericData(&'static str),

    #[error("Invalid value in column '{column}' at row {row}: {message}")]
    InvalidValue {
        column: String,
        row: usize,
        message: String,
    },
}

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;
