use std::path::PathBuf;

use polars::prelude::PolarsError;

pub type Result<T> = std::result::Result<T, IsopretError>;

/// Errors raised by the isopret analysis core and its loaders.
#[derive(Debug, thiserror::Error)]
pub enum IsopretError {
    /// A row of an input table does not have the expected shape. Fatal for the whole file.
    #[error("malformed input in {source_name} (line {line}): {message}")]
    MalformedInput {
        source_name: String,
        line: usize,
        message: String,
    },

    /// An accession that must resolve has no reference entry.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// The caller broke an invariant of the core (e.g. population is not a superset of the study).
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Degenerate input that has a defined fallback (only used for logging).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl IsopretError {
    /// Wrap an `io::Error` with the path that produced it.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }
}
