//! Weighting error types

use thiserror::Error;

use svy_core::data::{Category, DataError};

/// Errors raised while preparing or running a weighting job
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WeightingError {
    /// Required field missing or holding values outside its domain
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Population references do not fit the data
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A computation produced a non-finite or non-positive weight
    #[error("Numerical error: {message} (operation: {operation})")]
    Numerical {
        /// Error message
        message: String,
        /// Operation that failed
        operation: &'static str,
    },
}

impl WeightingError {
    pub(crate) fn numerical(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
            operation,
        }
    }
}

/// Mismatches between population references and the respondent data
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A category observed in the data has no population proportion
    #[error("Category {category} of '{variable}' is not in the population reference")]
    UnmappedCategory {
        variable: String,
        category: Category,
    },

    /// A population category has no valid respondent to carry its weight
    #[error("Population category {category} of '{variable}' has no respondents in the sample")]
    UnobservedCategory {
        variable: String,
        category: Category,
    },

    /// The chi-square statistic is undefined for a zero expected count
    #[error("Category {category} of '{variable}' has an expected count of zero")]
    ZeroExpectedCount {
        variable: String,
        category: Category,
    },

    /// No population reference was supplied for a control variable
    #[error("No population reference for control variable '{0}'")]
    MissingReference(String),

    /// The same control variable was configured twice
    #[error("Control variable '{0}' is configured more than once")]
    DuplicateControl(String),

    /// A composite stratum key has no entry in the stratum table
    #[error("Stratum key '{key}' of row {row} has no entry in the stratum table")]
    UnmatchedStratum { row: usize, key: String },

    /// A population reference table is malformed
    #[error("Invalid population reference for '{variable}': {message}")]
    InvalidReference { variable: String, message: String },

    /// Engine parameters out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ConfigurationError {
    pub(crate) fn invalid_reference(variable: &str, message: impl Into<String>) -> Self {
        Self::InvalidReference {
            variable: variable.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
