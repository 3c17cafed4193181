use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger connection failed: {0}")]
    Connection(String),

    #[error("ledger rejected publish: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("block {0} not found on ledger")]
    NotFound(String),

    #[error("block does not contain a TaggedData payload")]
    NotTaggedData,

    #[error("failed to decode block data: {0}")]
    Decode(String),
}
