use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("path traversal detected resolving entry under user directory")]
    PathTraversal,

    #[error("file size {actual} exceeds the {limit} byte limit")]
    SizeExceeded { limit: u64, actual: u64 },

    #[error("content hash mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("peer fetch failed: {0}")]
    Fetch(String),

    #[error("no peer held a usable replica of {0}")]
    NoReplicaAvailable(String),
}
