use thiserror::Error;

/// Reasons a candidate connection is declined by the store.
///
/// These are user-facing rejections: the graph is left untouched and the
/// message is suitable for a transient notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error(
        "A connection from '{source_node_id}' to '{target_node_id}' using the same handles already exists"
    )]
    DuplicateConnection {
        source_node_id: String,
        target_node_id: String,
    },

    #[error("Node '{0}' does not exist in the graph")]
    UnknownNode(String),

    #[error("Connecting '{source_node_id}' to '{target_node_id}' would create a cycle")]
    CycleDetected {
        source_node_id: String,
        target_node_id: String,
    },
}

/// Errors raised while decoding payloads that arrive from outside the core
/// (palette drops, configuration forms, persisted canvases).
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to parse payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid payload: {0}")]
    Invalid(String),
}

/// Errors reported by a `JobStorage` backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Job '{0}' was not found")]
    JobNotFound(String),

    #[error("Failed to serialize canvas: {0}")]
    Serialization(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}
