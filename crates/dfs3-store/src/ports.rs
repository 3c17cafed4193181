//! Outbound ports this crate depends on but does not implement. The
//! composition root (`dfs3-node`) wires concrete adapters — backed by
//! `dfs3-registry` and `dfs3-ledger`/`dfs3-bus` — into these traits, the
//! same driven-port shape the teacher uses for its storage adapters.

use async_trait::async_trait;

use dfs3_types::{FileId, NodeId};

use crate::errors::StoreError;

/// Resolves a peer's reachable URL for a given file, so this crate never
/// needs to depend on the node registry directly.
#[async_trait]
pub trait NodeLocator: Send + Sync {
    async fn file_url(&self, node_id: &NodeId, file_id: &FileId) -> Result<Option<String>, StoreError>;
}

/// Announces a freshly completed local replica to the rest of the
/// network. Implemented by composing a ledger publish with a bus
/// announcement once a `file_replicated` event has been signed.
#[async_trait]
pub trait ReplicationAnnouncer: Send + Sync {
    async fn announce_replicated(&self, file_id: &FileId) -> Result<(), StoreError>;
}
