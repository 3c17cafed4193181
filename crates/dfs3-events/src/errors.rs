use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event index database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to (de)serialize event payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("invalid signature on event from node {0}")]
    InvalidSignature(String),

    #[error("no known public key for signing node {0}")]
    UnknownSigner(String),

    #[error("registry error: {0}")]
    Registry(#[from] dfs3_registry::RegistryError),

    #[error("store error: {0}")]
    Store(#[from] dfs3_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] dfs3_ledger::LedgerError),

    #[error("bus error: {0}")]
    Bus(#[from] dfs3_bus::errors::BusError),
}
