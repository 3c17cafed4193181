//! Concrete adapters wiring `dfs3-store`'s and `dfs3-events`' outbound
//! ports to the rest of the running node: resolving a peer's address
//! through the node registry, announcing a finished replica by
//! publishing a signed event, and performing a background clone once
//! `dfs3-events` has decided one is warranted.

use std::sync::Arc;

use async_trait::async_trait;

use dfs3_events::{CloneCoordinator, EventError, EventPublisher};
use dfs3_registry::NodeRegistry;
use dfs3_store::errors::StoreError;
use dfs3_store::{BlobStore, NodeLocator, PeerFetcher, ReplicationAnnouncer, CLONE_FETCH_TIMEOUT};
use dfs3_types::{EventType, FileId, FileReplicatedPayload, NodeId};

/// Resolves a peer's blob endpoint from the node registry's recorded
/// `ip`/`port`, the same address a node advertised in its own
/// `node_registered` event.
pub struct RegistryNodeLocator {
    registry: Arc<NodeRegistry>,
}

impl RegistryNodeLocator {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl NodeLocator for RegistryNodeLocator {
    async fn file_url(&self, node_id: &NodeId, file_id: &FileId) -> Result<Option<String>, StoreError> {
        let record = match self.registry.get(node_id)? {
            Some(record) => record,
            None => return Ok(None),
        };
        Ok(Some(format!(
            "http://{}:{}/api/v1/files/{}/data",
            record.ip, record.port, file_id
        )))
    }
}

/// Announces a freshly completed local replica by publishing a signed
/// `file_replicated` event through the same publisher every other event
/// goes through.
pub struct PublisherReplicationAnnouncer {
    publisher: Arc<EventPublisher>,
}

impl PublisherReplicationAnnouncer {
    pub fn new(publisher: Arc<EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl ReplicationAnnouncer for PublisherReplicationAnnouncer {
    async fn announce_replicated(&self, file_id: &FileId) -> Result<(), StoreError> {
        self.publisher
            .publish(
                EventType::FileReplicated,
                FileReplicatedPayload {
                    file_id: file_id.clone(),
                },
            )
            .await
            .map(|_block_id| ())
            .map_err(|e| StoreError::Fetch(e.to_string()))
    }
}

/// Performs the replica fetch `dfs3-events` decided was warranted: pulls
/// the ciphertext from `source_node_id`, writes it verified locally, and
/// announces the new replica to the network.
pub struct HttpCloneCoordinator<A> {
    fetcher: Arc<dyn PeerFetcher>,
    blobs: Arc<BlobStore>,
    announcer: Arc<A>,
}

impl<A> HttpCloneCoordinator<A> {
    pub fn new(fetcher: Arc<dyn PeerFetcher>, blobs: Arc<BlobStore>, announcer: Arc<A>) -> Self {
        Self {
            fetcher,
            blobs,
            announcer,
        }
    }
}

#[async_trait]
impl<A> CloneCoordinator for HttpCloneCoordinator<A>
where
    A: ReplicationAnnouncer,
{
    async fn clone_from(&self, file_id: &FileId, source_node_id: &NodeId) -> Result<(), EventError> {
        let bytes = self
            .fetcher
            .fetch(source_node_id, file_id, CLONE_FETCH_TIMEOUT)
            .await?;
        self.blobs.write_verified(file_id, &bytes).await?;
        self.announcer.announce_replicated(file_id).await?;
        Ok(())
    }
}
