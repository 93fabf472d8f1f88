//! Error types for the document model

use thiserror::Error;

use crate::path::Path;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node already exists: {0}")]
    DuplicateNode(String),

    #[error("Node {0} has no parent")]
    MissingParent(String),

    #[error("No collection at path `{0}`")]
    MissingCollection(Path),

    #[error("No text property at path `{0}`")]
    NotTextProperty(Path),

    #[error("Invalid path `{0}`")]
    InvalidPath(Path),

    #[error("Linking `{id}` under `{container}` would create a cycle")]
    CycleDetected { id: String, container: String },

    #[error("Index {index} out of bounds for collection `{path}` of length {len}")]
    IndexOutOfBounds {
        path: Path,
        index: usize,
        len: usize,
    },
}
