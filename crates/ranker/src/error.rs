//! Error types for snapshot and configuration loading.
//!
//! The scoring path itself never fails: empty snapshots, missing fields,
//! degenerate populations and over-aggressive filters all have defined
//! fallbacks. Errors only surface at the collaborator boundary.

use thiserror::Error;

/// Result type for ranking operations.
pub type Result<T> = std::result::Result<T, RankError>;

/// Errors raised while loading snapshots or configuration.
#[derive(Debug, Error)]
pub enum RankError {
    /// Missing required column in a snapshot frame
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Date string that is neither `YYYYMMDD` nor `YYYY-MM-DD`
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Configuration that violates a table invariant
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error while reading a snapshot or config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
