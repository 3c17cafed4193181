//! Bus-consume loop: turns [`BusAnnouncement`]s into dispatched, indexed
//! events. A bad or duplicate announcement is logged and dropped — one
//! malformed event must never take down the loop for every other node.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;

use dfs3_bus::BusAnnouncement;
use dfs3_ledger::LedgerClient;
use dfs3_registry::NodeRegistry;
use dfs3_types::envelope::EventEnvelope;

use crate::dispatch::{timestamp_seconds, EventDispatcher};
use crate::errors::EventError;
use crate::index::{EventIndex, EventIndexEntry};
use crate::verify::verify_envelope;

/// Anything that yields [`BusAnnouncement`]s one at a time, implemented
/// locally for both `dfs3-bus` listener types so this crate can stay
/// generic over MQTT vs. in-memory transport.
#[async_trait]
pub trait AnnouncementSource: Send {
    async fn recv(&mut self) -> Option<BusAnnouncement>;
}

#[async_trait]
impl AnnouncementSource for dfs3_bus::BusListener {
    async fn recv(&mut self) -> Option<BusAnnouncement> {
        dfs3_bus::BusListener::recv(self).await
    }
}

#[async_trait]
impl AnnouncementSource for dfs3_bus::InMemoryListener {
    async fn recv(&mut self) -> Option<BusAnnouncement> {
        dfs3_bus::InMemoryListener::recv(self).await
    }
}

pub struct EventListener<L> {
    ledger: Arc<L>,
    index: Arc<EventIndex>,
    registry: Arc<NodeRegistry>,
    dispatcher: Arc<EventDispatcher>,
}

impl<L: LedgerClient> EventListener<L> {
    pub fn new(
        ledger: Arc<L>,
        index: Arc<EventIndex>,
        registry: Arc<NodeRegistry>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            ledger,
            index,
            registry,
            dispatcher,
        }
    }

    /// Exposes the dispatcher's seeding flag so a caller replaying a seed
    /// node's event history can suppress background cloning for the
    /// duration of the replay.
    pub fn seeding_flag(&self) -> Arc<AtomicBool> {
        self.dispatcher.seeding_flag()
    }

    /// Drains `source` until it closes, processing one announcement at a
    /// time. Intended to run as its own long-lived task.
    pub async fn run(&self, mut source: impl AnnouncementSource) {
        while let Some(announcement) = source.recv().await {
            self.process(announcement).await;
        }
        tracing::info!("announcement source closed, listener loop exiting");
    }

    /// Processes a single announcement, logging and swallowing any
    /// failure so the caller's loop never has to handle per-event errors.
    pub async fn process(&self, announcement: BusAnnouncement) {
        if let Err(e) = self.process_inner(&announcement).await {
            tracing::warn!(error = %e, block_id = %announcement.block_id, "failed to process announced event");
        }
    }

    async fn process_inner(&self, announcement: &BusAnnouncement) -> Result<(), EventError> {
        if self.index.contains(&announcement.block_id)? {
            return Ok(());
        }

        let bytes = self.ledger.fetch(&announcement.block_id).await?;
        let envelope: EventEnvelope = serde_json::from_slice(&bytes)?;

        verify_envelope(&envelope, &self.registry)?;
        self.dispatcher.dispatch(&envelope).await?;

        self.index.record(&EventIndexEntry {
            block_id: announcement.block_id.clone(),
            event_type: envelope.event_type,
            timestamp: timestamp_seconds(&envelope),
            node_id: envelope.node_id.clone(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use dfs3_crypto::Ed25519KeyPair;
    use dfs3_ledger::InMemoryLedger;
    use dfs3_registry::UserRegistry;
    use dfs3_store::{ClonePolicy, FileMetadataStore};
    use dfs3_types::entities::NodeRecord;
    use dfs3_types::events::{EventType, UserRegisteredPayload};
    use dfs3_types::ids::{Alias, FileId, NodeId, Tag, UserId};
    use dfs3_types::envelope::PROTOCOL;
    use rusqlite::Connection;

    struct NoopCoordinator;

    #[async_trait]
    impl crate::ports::CloneCoordinator for NoopCoordinator {
        async fn clone_from(&self, _file_id: &FileId, _source_node_id: &NodeId) -> Result<(), EventError> {
            Ok(())
        }
    }

    fn listener() -> (EventListener<InMemoryLedger>, Arc<EventIndex>, Arc<NodeRegistry>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(InMemoryLedger::new());
        let index = Arc::new(EventIndex::open(Connection::open_in_memory().unwrap()).unwrap());
        let node_registry = Arc::new(NodeRegistry::open(Connection::open_in_memory().unwrap()).unwrap());
        let user_registry = Arc::new(UserRegistry::open(Connection::open_in_memory().unwrap()).unwrap());
        let file_store = Arc::new(FileMetadataStore::new(dir.path().join("meta"), dir.path().join("users")));
        let dispatcher = Arc::new(EventDispatcher::new(
            node_registry.clone(),
            user_registry.clone(),
            file_store,
            NodeId::try_from("a".repeat(64)).unwrap(),
            ClonePolicy::Always,
            Arc::new(NoopCoordinator),
        ));
        (
            EventListener::new(ledger, index.clone(), node_registry.clone(), dispatcher),
            index,
            node_registry,
            dir,
        )
    }

    /// Registers `node_id`'s public key so events it signs (other than the
    /// self-describing `node_registered`) can verify against the registry.
    fn register_signer(registry: &NodeRegistry, node_id: &NodeId, key_pair: &Ed25519KeyPair) {
        registry
            .save(&NodeRecord {
                node_id: node_id.clone(),
                alias: Alias::try_from("signer-node".to_string()).unwrap(),
                hostname: dfs3_types::Hostname::try_from("localhost".to_string()).unwrap(),
                public_key: STANDARD.encode(key_pair.public_key().as_bytes()),
                platform: "linux".to_string(),
                software_version: "0.1.0".to_string(),
                uptime: 0,
                total_space: 0,
                ip: "127.0.0.1".parse().unwrap(),
                port: 8443,
                tags: Vec::<Tag>::new(),
                creation_date: 0,
                version: 1,
                last_seen: 0,
            })
            .unwrap();
    }

    fn signed_user_registered(key_pair: &Ed25519KeyPair, node_id: NodeId) -> EventEnvelope {
        let public_key_b64 = STANDARD.encode(key_pair.public_key().as_bytes());
        let payload = UserRegisteredPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            alias: Alias::try_from("alice".to_string()).unwrap(),
            public_key: public_key_b64,
        };
        let mut envelope = EventEnvelope {
            event_type: EventType::UserRegistered,
            timestamp: "2026-07-26T00:00:00Z".to_string(),
            node_id,
            protocol: PROTOCOL.to_string(),
            payload: serde_json::to_value(payload).unwrap(),
            signature: String::new(),
        };
        let message = envelope.canonical_bytes().unwrap();
        let signature = key_pair.sign(&message);
        envelope.signature = STANDARD.encode(signature.as_bytes());
        envelope
    }

    #[tokio::test]
    async fn processing_an_announcement_indexes_and_dispatches_it() {
        let (listener, index, registry, _dir) = listener();
        let key_pair = Ed25519KeyPair::generate();
        let node_id = NodeId::try_from("a".repeat(64)).unwrap();
        register_signer(&registry, &node_id, &key_pair);
        let envelope = signed_user_registered(&key_pair, node_id.clone());

        let bytes = serde_json::to_vec(&envelope).unwrap();
        let block_id = listener.ledger.publish(&bytes).await.unwrap();

        let announcement = BusAnnouncement::new(block_id.clone(), EventType::UserRegistered, envelope.timestamp.clone(), node_id);
        listener.process(announcement.clone()).await;

        assert!(index.contains(&block_id).unwrap());
    }

    #[tokio::test]
    async fn duplicate_announcement_is_processed_only_once() {
        let (listener, index, registry, _dir) = listener();
        let key_pair = Ed25519KeyPair::generate();
        let node_id = NodeId::try_from("a".repeat(64)).unwrap();
        register_signer(&registry, &node_id, &key_pair);
        let envelope = signed_user_registered(&key_pair, node_id.clone());

        let bytes = serde_json::to_vec(&envelope).unwrap();
        let block_id = listener.ledger.publish(&bytes).await.unwrap();
        let announcement = BusAnnouncement::new(block_id.clone(), EventType::UserRegistered, envelope.timestamp.clone(), node_id);

        listener.process(announcement.clone()).await;
        listener.process(announcement).await;

        assert!(index.contains(&block_id).unwrap());
    }
}
