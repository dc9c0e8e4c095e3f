//! Error types for Synheart Sift

use thiserror::Error;

/// Errors that can occur while ingesting, configuring, or encoding.
///
/// The preparation pipeline itself never fails: malformed cells are coerced to
/// missing values and filtered out. Everything here happens at the edges.
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed table: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Row {row} has {found} fields but the header declares {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
