//! Error types for the preprocessing pipeline.

use std::path::PathBuf;

/// Errors from whole-run configuration and I/O.
///
/// Per-example problems (unalignable pairs, out-of-vocabulary insertion
/// phrases) never surface here; they resolve to the feasibility flag on
/// the converted example.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Label map could not be parsed.
    #[error("invalid label map {path:?}: {reason}")]
    LabelMap {
        /// Path of the offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Malformed tab-delimited input.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON serialization failure while writing output.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A structurally invalid input line.
    #[error("bad record at line {line}: {reason}")]
    BadRecord {
        /// 1-based line number in the input file.
        line: usize,
        /// What was expected.
        reason: String,
    },
}

/// Result type for preprocessing operations.
pub type PrepResult<T> = Result<T, PrepError>;
