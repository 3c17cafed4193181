//! Outbound port for the one piece of `file_created` handling this crate
//! cannot do itself: racing a fetch against peers and writing the blob
//! locally needs `dfs3-store`'s `PeerFetcher`/`BlobStore` wired to a live
//! HTTP client, which belongs to the composition root, not here. This
//! crate only decides *whether* to clone; the `dfs3-node` binary decides
//! *how*.

use async_trait::async_trait;

use dfs3_types::{FileId, NodeId};

use crate::errors::EventError;

/// Performs the actual background replica fetch once eligibility has
/// already been decided.
#[async_trait]
pub trait CloneCoordinator: Send + Sync {
    async fn clone_from(&self, file_id: &FileId, source_node_id: &NodeId) -> Result<(), EventError>;
}
