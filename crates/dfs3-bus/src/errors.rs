use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus connection error: {0}")]
    Connection(String),

    #[error("failed to encode announcement: {0}")]
    Encoding(String),
}
