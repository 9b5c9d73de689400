//! Core data structures for survey post-processing
//!
//! The [`data`] module holds the column-oriented [`data::DataFrame`] that
//! respondent records travel in, and the [`data::Category`] code type used
//! for categorical survey fields.

pub mod data;

pub use data::{Category, DataError, DataFrame, DataFrameBuilder, Series};
