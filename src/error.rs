//! File-scoped errors. None of these abort a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// File content is not valid JSON.
    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Reading, serializing or writing the file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A value has a shape the pipeline cannot repair.
    #[error("unexpected value shape: {0}")]
    UnexpectedShape(String),
}

impl NormalizeError {
    pub fn shape(detail: impl Into<String>) -> Self {
        Self::UnexpectedShape(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
