//! Per-event-type dispatch: once an envelope has been indexed and its
//! signature verified, this turns its payload into the matching registry
//! or file-store mutation. Grounded in the individual `save_*`/`create`/
//! `share` handlers scattered across `core/nodes.py`, `core/users.py` and
//! `core/files.py` — this module is their single point of entry, playing
//! the role the original left as an empty stub in `core/event_handler.py`.

use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dfs3_types::entities::{NodeRecord, UserRecord};
use dfs3_types::envelope::EventEnvelope;
use dfs3_types::events::{
    EventType, FileCreatedPayload, FileDeletedPayload, FileRenamedPayload, FileReplicatedPayload,
    FileSharedPayload, NodeRegisteredPayload, NodeStatusPayload, UserRegisteredPayload,
};
use dfs3_types::ids::NodeId;

use dfs3_registry::{NodeRegistry, UserRegistry};
use dfs3_store::{ClonePolicy, FileMetadataStore, NodeCandidate};

use crate::errors::EventError;
use crate::ports::CloneCoordinator;

/// Timestamp parsing shared by every handler that needs a Unix-seconds
/// value out of an envelope's RFC 3339 `timestamp` field.
pub(crate) fn timestamp_seconds(envelope: &EventEnvelope) -> i64 {
    chrono::DateTime::parse_from_rfc3339(&envelope.timestamp)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

/// Applies every domain mutation a verified, indexed event implies.
/// Unknown event types and malformed payloads are logged and swallowed —
/// this must never propagate an error out of the bus-consume loop for a
/// single bad event.
pub struct EventDispatcher {
    node_registry: Arc<NodeRegistry>,
    user_registry: Arc<UserRegistry>,
    file_store: Arc<FileMetadataStore>,
    local_node_id: NodeId,
    clone_policy: ClonePolicy,
    clone_coordinator: Arc<dyn CloneCoordinator>,
    /// Set while this node is replaying another node's event history at
    /// startup, so `file_created` events ingested during that replay never
    /// trigger background clones. Cleared once the replay completes.
    seeding: Arc<AtomicBool>,
}

impl EventDispatcher {
    pub fn new(
        node_registry: Arc<NodeRegistry>,
        user_registry: Arc<UserRegistry>,
        file_store: Arc<FileMetadataStore>,
        local_node_id: NodeId,
        clone_policy: ClonePolicy,
        clone_coordinator: Arc<dyn CloneCoordinator>,
    ) -> Self {
        Self {
            node_registry,
            user_registry,
            file_store,
            local_node_id,
            clone_policy,
            clone_coordinator,
            seeding: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares this dispatcher's seeding flag so a caller driving an event
    /// replay (e.g. from a seed node at startup) can toggle it around the
    /// replay without reaching into dispatcher internals.
    pub fn seeding_flag(&self) -> Arc<AtomicBool> {
        self.seeding.clone()
    }

    pub async fn dispatch(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let span = tracing::info_span!(
            "dispatch_event",
            event_type = envelope.event_type.as_str(),
            node_id = %envelope.node_id,
        );
        let _guard = span.enter();

        match envelope.event_type {
            EventType::UserRegistered => self.on_user_registered(envelope),
            EventType::NodeRegistered => self.on_node_registered(envelope),
            EventType::NodeStatus => self.on_node_status(envelope),
            EventType::FileCreated => self.on_file_created(envelope).await,
            EventType::FileShared => self.on_file_shared(envelope),
            EventType::FileRenamed => self.on_file_renamed(envelope),
            EventType::FileDeleted => self.on_file_deleted(envelope),
            EventType::FileReplicated => self.on_file_replicated(envelope),
            EventType::FileAccessed => Ok(()),
            EventType::UserJoinedNode => Ok(()),
            EventType::FileCopied => {
                tracing::warn!("file_copied received but never emitted by this implementation, ignoring");
                Ok(())
            }
        }
    }

    fn on_user_registered(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: UserRegisteredPayload = serde_json::from_value(envelope.payload.clone())?;
        self.user_registry.register(&UserRecord {
            user_id: payload.user_id,
            alias: payload.alias,
            public_key: payload.public_key,
            creation_date: timestamp_seconds(envelope),
        })?;
        Ok(())
    }

    fn on_node_registered(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: NodeRegisteredPayload = serde_json::from_value(envelope.payload.clone())?;
        let creation_date = timestamp_seconds(envelope);
        self.node_registry.save(&NodeRecord {
            node_id: envelope.node_id.clone(),
            alias: payload.alias,
            hostname: payload.hostname,
            public_key: payload.public_key,
            platform: payload.platform,
            software_version: payload.software_version,
            uptime: payload.uptime,
            total_space: payload.total_space,
            ip: payload.ip,
            port: payload.port,
            tags: payload.tags,
            creation_date,
            version: payload.version,
            last_seen: creation_date,
        })?;
        Ok(())
    }

    fn on_node_status(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: NodeStatusPayload = serde_json::from_value(envelope.payload.clone())?;
        self.node_registry.update_status(
            &envelope.node_id,
            payload.uptime,
            payload.total_space,
            timestamp_seconds(envelope),
        )?;
        Ok(())
    }

    async fn on_file_created(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: FileCreatedPayload = serde_json::from_value(envelope.payload.clone())?;
        let creation_date = timestamp_seconds(envelope);
        let size = payload.size;
        let file_id = payload.file_id.clone();

        self.file_store.create(&payload, &envelope.node_id, creation_date)?;

        if envelope.node_id == self.local_node_id {
            return Ok(());
        }

        let candidates = self.build_candidates(timestamp_seconds(envelope))?;
        let eligible = self.clone_policy.eligibility().is_eligible(
            &self.local_node_id,
            &envelope.node_id,
            size,
            &candidates,
            timestamp_seconds(envelope),
            self.seeding.load(Ordering::Relaxed),
        );

        if eligible {
            if let Err(e) = self.clone_coordinator.clone_from(&file_id, &envelope.node_id).await {
                tracing::warn!(error = %e, %file_id, "background clone failed");
            }
        }
        Ok(())
    }

    fn build_candidates(&self, _now: i64) -> Result<Vec<NodeCandidate>, EventError> {
        let mut candidates = Vec::new();
        for entry in self.node_registry.list_nodes()? {
            if let Some(record) = self.node_registry.get(&entry.node_id)? {
                candidates.push(NodeCandidate {
                    node_id: record.node_id,
                    uptime: record.uptime,
                    last_seen: record.last_seen,
                    free_space: record.total_space,
                });
            }
        }
        Ok(candidates)
    }

    fn on_file_shared(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: FileSharedPayload = serde_json::from_value(envelope.payload.clone())?;
        self.file_store.share(&payload)?;
        Ok(())
    }

    fn on_file_renamed(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: FileRenamedPayload = serde_json::from_value(envelope.payload.clone())?;
        self.file_store.rename(&payload)?;
        Ok(())
    }

    fn on_file_deleted(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: FileDeletedPayload = serde_json::from_value(envelope.payload.clone())?;
        self.file_store.delete(&payload)?;
        Ok(())
    }

    fn on_file_replicated(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        let payload: FileReplicatedPayload = serde_json::from_value(envelope.payload.clone())?;
        self.file_store.replicate(&payload, &envelope.node_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dfs3_types::ids::{Alias, Hostname, MimeType, UserId};
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopCoordinator {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CloneCoordinator for NoopCoordinator {
        async fn clone_from(&self, _file_id: &dfs3_types::FileId, _source_node_id: &NodeId) -> Result<(), EventError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn dispatcher(local_node_id: NodeId, calls: Arc<AtomicUsize>) -> (EventDispatcher, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let node_registry = Arc::new(NodeRegistry::open(Connection::open_in_memory().unwrap()).unwrap());
        let user_registry = Arc::new(UserRegistry::open(Connection::open_in_memory().unwrap()).unwrap());
        let file_store = Arc::new(FileMetadataStore::new(dir.path().join("meta"), dir.path().join("users")));
        let coordinator = Arc::new(NoopCoordinator { calls });
        (
            EventDispatcher::new(
                node_registry,
                user_registry,
                file_store,
                local_node_id,
                ClonePolicy::Always,
                coordinator,
            ),
            dir,
        )
    }

    fn envelope(event_type: EventType, node_id: NodeId, payload: serde_json::Value) -> EventEnvelope {
        EventEnvelope {
            event_type,
            timestamp: "2026-07-26T10:00:00Z".to_string(),
            node_id,
            protocol: dfs3_types::envelope::PROTOCOL.to_string(),
            payload,
            signature: "placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn user_registered_populates_the_user_registry() {
        let local = NodeId::try_from("a".repeat(64)).unwrap();
        let (dispatcher, _dir) = dispatcher(local, Arc::new(AtomicUsize::new(0)));

        let payload = UserRegisteredPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            alias: Alias::try_from("alice".to_string()).unwrap(),
            public_key: "key".to_string(),
        };
        let env = envelope(
            EventType::UserRegistered,
            NodeId::try_from("a".repeat(64)).unwrap(),
            serde_json::to_value(payload).unwrap(),
        );

        dispatcher.dispatch(&env).await.unwrap();
        assert!(dispatcher
            .user_registry
            .exists(&UserId::try_from("b".repeat(64)).unwrap())
            .unwrap());
    }

    #[tokio::test]
    async fn file_created_from_a_remote_node_triggers_clone_under_always_policy() {
        let local = NodeId::try_from("a".repeat(64)).unwrap();
        let remote = NodeId::try_from("f".repeat(64)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let (dispatcher, _dir) = dispatcher(local, calls.clone());

        let payload = FileCreatedPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            filename: dfs3_types::Filename::try_from("notes.txt".to_string()).unwrap(),
            file_id: dfs3_types::FileId::try_from("c".repeat(64)).unwrap(),
            mimetype: MimeType::try_from("text/plain".to_string()).unwrap(),
            size: 10,
            iv: vec![7, 7, 7, 7],
            authorized_users: vec![],
            version: 1,
        };
        let env = envelope(EventType::FileCreated, remote, serde_json::to_value(payload).unwrap());

        dispatcher.dispatch(&env).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn file_created_while_seeding_never_triggers_clone() {
        let local = NodeId::try_from("a".repeat(64)).unwrap();
        let remote = NodeId::try_from("f".repeat(64)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let (dispatcher, _dir) = dispatcher(local, calls.clone());
        dispatcher.seeding_flag().store(true, Ordering::SeqCst);

        let payload = FileCreatedPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            filename: dfs3_types::Filename::try_from("notes.txt".to_string()).unwrap(),
            file_id: dfs3_types::FileId::try_from("c".repeat(64)).unwrap(),
            mimetype: MimeType::try_from("text/plain".to_string()).unwrap(),
            size: 10,
            iv: vec![7, 7, 7, 7],
            authorized_users: vec![],
            version: 1,
        };
        let env = envelope(EventType::FileCreated, remote, serde_json::to_value(payload).unwrap());

        dispatcher.dispatch(&env).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn file_created_from_the_local_node_never_triggers_clone() {
        let local = NodeId::try_from("a".repeat(64)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let (dispatcher, _dir) = dispatcher(local.clone(), calls.clone());

        let payload = FileCreatedPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            filename: dfs3_types::Filename::try_from("notes.txt".to_string()).unwrap(),
            file_id: dfs3_types::FileId::try_from("c".repeat(64)).unwrap(),
            mimetype: MimeType::try_from("text/plain".to_string()).unwrap(),
            size: 10,
            iv: vec![7, 7, 7, 7],
            authorized_users: vec![],
            version: 1,
        };
        let env = envelope(EventType::FileCreated, local, serde_json::to_value(payload).unwrap());

        dispatcher.dispatch(&env).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
