use thiserror::Error;

/// Errors that can surface while bootstrapping or running a node. Anything
/// that escapes to `main` is fatal and logged before the process exits.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("identity error: {0}")]
    Crypto(#[from] dfs3_crypto::CryptoError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Store(#[from] dfs3_store::errors::StoreError),

    #[error(transparent)]
    Events(#[from] dfs3_events::errors::EventError),

    #[error(transparent)]
    Registry(#[from] dfs3_registry::errors::RegistryError),

    #[error(transparent)]
    Ledger(#[from] dfs3_ledger::errors::LedgerError),

    #[error(transparent)]
    Bus(#[from] dfs3_bus::errors::BusError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
