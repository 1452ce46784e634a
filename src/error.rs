//! Error types for the anno-compare library.

use thiserror::Error;

/// Result type for anno-compare operations.
pub type Result<T> = std::result::Result<T, CompareError>;

/// Error types that can occur while loading or comparing annotation results.
#[derive(Error, Debug)]
pub enum CompareError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The embedded `labels` string of a log could not be decoded.
    #[error("Invalid labels in log {log_id}: {source}")]
    InvalidLabels {
        log_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid IoU threshold or threshold range.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// The one-to-one assignment could not be built.
    #[error("Assignment error: {0}")]
    Assignment(String),

    /// No image pair with the requested key.
    #[error("Pair not found: {0}")]
    PairNotFound(String),

    /// Several image pairs share the requested key.
    #[error("Pair key {key} is shared by {count} image pairs")]
    AmbiguousPair { key: String, count: usize },

    /// A DataFrame is missing a required column.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A DataFrame does not have the expected shape or types.
    #[error("Invalid DataFrame: {0}")]
    InvalidDataFrame(String),

    /// Error raised by Polars.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
