//! Error types for the analysis pipeline

use thiserror::Error;

/// Errors raised while reading a capture, correlating, or exporting results
#[derive(Debug, Error)]
pub enum LatencyError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A time or level cell that could not be parsed as a sample
    #[error("row {row}, column {column}: invalid sample value {value:?}")]
    InvalidSample {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("row {row} has no column {column}")]
    MissingColumn { row: usize, column: usize },

    /// No trigger transition could be matched to a frame or pulse
    #[error("no correlated delay samples to summarize")]
    EmptyResultSet,
}

pub type Result<T> = std::result::Result<T, LatencyError>;
