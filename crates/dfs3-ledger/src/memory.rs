//! In-memory ledger fake used by integration tests and single-process
//! dev runs, standing in for a live ledger node.

use async_trait::async_trait;
use dfs3_crypto::sha256_hex;
use dfs3_types::BlockId;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Mutex;

use crate::errors::LedgerError;
use crate::LedgerClient;

#[derive(Default)]
pub struct InMemoryLedger {
    blocks: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn publish(&self, envelope_bytes: &[u8]) -> Result<BlockId, LedgerError> {
        let block_id = format!("0x{}", sha256_hex(envelope_bytes));
        self.blocks
            .lock()
            .unwrap()
            .insert(block_id.clone(), envelope_bytes.to_vec());
        BlockId::try_from(block_id).map_err(|e| LedgerError::Decode(e.to_string()))
    }

    async fn fetch(&self, block_id: &BlockId) -> Result<Vec<u8>, LedgerError> {
        self.blocks
            .lock()
            .unwrap()
            .get(block_id.as_str())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(block_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_fetch_round_trips() {
        let ledger = InMemoryLedger::new();
        let body = b"{\"event_type\":\"file_created\"}".to_vec();
        let block_id = ledger.publish(&body).await.unwrap();
        let fetched = ledger.fetch(&block_id).await.unwrap();
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn fetch_unknown_block_fails() {
        let ledger = InMemoryLedger::new();
        let block_id = BlockId::try_from("0x".to_string() + &"9".repeat(64)).unwrap();
        assert!(ledger.fetch(&block_id).await.is_err());
    }

    #[tokio::test]
    async fn same_bytes_publish_to_same_block_id() {
        let ledger = InMemoryLedger::new();
        let body = b"identical payload".to_vec();
        let first = ledger.publish(&body).await.unwrap();
        let second = ledger.publish(&body).await.unwrap();
        assert_eq!(first, second);
    }
}
