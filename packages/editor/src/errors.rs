//! Error types for the editing engine

use thiserror::Error;

use vellum_model::{ModelError, Path};

use crate::observer::ObserverError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Range {start}..{end} exceeds length {len} of `{path}`")]
    InvalidRange {
        path: Path,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Coordinate path `{0}` does not resolve under the container")]
    InvalidCoordinate(Path),

    #[error("Unknown selection type: {0}")]
    UnknownSelectionType(String),

    #[error("Malformed selection descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),

    #[error("A transaction is already open")]
    ReentrantTransaction,

    #[error("Commit failed after operations were applied: {0}")]
    CommitFailure(#[source] ObserverError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Transaction aborted: {0}")]
    Aborted(String),
}

impl From<String> for EditorError {
    fn from(reason: String) -> Self {
        EditorError::Aborted(reason)
    }
}

impl From<&str> for EditorError {
    fn from(reason: &str) -> Self {
        EditorError::Aborted(reason.to_string())
    }
}
