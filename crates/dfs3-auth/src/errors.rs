use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user {0} is not locally known")]
    UnknownUser(String),

    #[error("no challenge outstanding for user {0}, or it expired")]
    ChallengeMissing(String),

    #[error("signature does not match the outstanding challenge")]
    InvalidSignature,

    #[error("missing, malformed or expired bearer session")]
    Unauthorized,

    #[error("registry error: {0}")]
    Registry(#[from] dfs3_registry::RegistryError),

    #[error("event publish error: {0}")]
    Events(#[from] dfs3_events::EventError),
}
