//! # dfs3-ledger
//!
//! Client for the append-only distributed ledger nodes publish signed
//! events to. Grounded in the original implementation's IOTA tagged-data
//! client: a node POSTs a block whose payload wraps the event envelope's
//! JSON bytes as hex, and later peers fetch that same block by id and
//! unwrap it back to JSON.

pub mod errors;
pub mod http;
pub mod memory;

pub use errors::LedgerError;
pub use http::HttpLedgerClient;
pub use memory::InMemoryLedger;

use async_trait::async_trait;
use dfs3_types::BlockId;

/// A ledger client publishes opaque signed-event bytes and fetches them
/// back by the id the ledger assigned on publish.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Publishes `envelope_bytes` (the canonical JSON of a signed
    /// `EventEnvelope`) and returns the ledger's block id for it.
    async fn publish(&self, envelope_bytes: &[u8]) -> Result<BlockId, LedgerError>;

    /// Fetches the raw envelope bytes previously published under
    /// `block_id`.
    async fn fetch(&self, block_id: &BlockId) -> Result<Vec<u8>, LedgerError>;
}
