use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("failed to (de)serialize registry column: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid identifier in registry row: {0}")]
    InvalidId(String),
}
