//! # Event Payload Schemas
//!
//! The fixed payload shape for each of the eleven dfs3 event types. These
//! are deserialized out of [`crate::envelope::EventEnvelope::payload`] once
//! a handler in `dfs3-events` knows `event_type`.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::entities::AuthorizedUserEntry;
use crate::ids::{Alias, FileId, Hostname, MimeType, NodeId, Tag, UserId};

/// The eleven event types dfs3 knows about. `FileCopied` is reserved by the
/// wire protocol but never emitted by this implementation (see
/// `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    UserRegistered,
    UserJoinedNode,
    NodeRegistered,
    NodeStatus,
    FileCreated,
    FileShared,
    FileAccessed,
    FileRenamed,
    FileDeleted,
    FileReplicated,
    /// Reserved; never emitted.
    FileCopied,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserRegistered => "user_registered",
            EventType::UserJoinedNode => "user_joined_node",
            EventType::NodeRegistered => "node_registered",
            EventType::NodeStatus => "node_status",
            EventType::FileCreated => "file_created",
            EventType::FileShared => "file_shared",
            EventType::FileAccessed => "file_accessed",
            EventType::FileRenamed => "file_renamed",
            EventType::FileDeleted => "file_deleted",
            EventType::FileReplicated => "file_replicated",
            EventType::FileCopied => "file_copied",
        }
    }

    /// `true` for every event type except the latest `node_status` per
    /// node, used by the event-listing dedup rule (mirrors
    /// `core/events.py: list_events`'s `UNION` query).
    pub fn is_status(&self) -> bool {
        matches!(self, EventType::NodeStatus)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegisteredPayload {
    pub user_id: UserId,
    pub alias: Alias,
    /// Base64-encoded Ed25519 public key.
    pub public_key: String,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJoinedNodePayload {
    pub user_id: UserId,
    pub challenge: String,
    pub public_key: String,
    #[serde_as(as = "Bytes")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegisteredPayload {
    pub alias: Alias,
    pub hostname: Hostname,
    pub public_key: String,
    pub platform: String,
    pub software_version: String,
    pub uptime: u64,
    pub total_space: u64,
    pub ip: std::net::IpAddr,
    pub port: u16,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusPayload {
    pub uptime: u64,
    pub total_space: u64,
    pub ip: std::net::IpAddr,
    pub port: u16,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCreatedPayload {
    pub user_id: UserId,
    pub filename: Filename,
    pub file_id: FileId,
    pub mimetype: MimeType,
    pub size: u64,
    /// Base64-encoded content encryption IV, distinct from each
    /// authorized user's key-wrap IV.
    #[serde_as(as = "Bytes")]
    pub iv: Vec<u8>,
    #[serde(default)]
    pub authorized_users: Vec<AuthorizedUserEntry>,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSharedPayload {
    pub user_id: UserId,
    pub file_id: FileId,
    pub filename: Filename,
    pub authorized_users: Vec<AuthorizedUserEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAccessedPayload {
    pub user_id: UserId,
    pub file_id: FileId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRenamedPayload {
    pub user_id: UserId,
    pub file_id: FileId,
    pub old_filename: Filename,
    pub new_filename: Filename,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDeletedPayload {
    pub user_id: UserId,
    pub file_id: FileId,
    pub filename: Filename,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReplicatedPayload {
    pub file_id: FileId,
}

fn default_version() -> u32 {
    1
}

pub use crate::ids::Filename;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_serializes_snake_case() {
        let json = serde_json::to_string(&EventType::FileCreated).unwrap();
        assert_eq!(json, "\"file_created\"");
        assert_eq!(EventType::FileCreated.as_str(), "file_created");
    }

    #[test]
    fn node_registered_payload_defaults_version_and_tags() {
        let json = serde_json::json!({
            "alias": "seed-1",
            "hostname": "seed1.example.com",
            "public_key": "QQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQ=",
            "platform": "linux-x86_64",
            "software_version": "dfs3-node/0.3.1",
            "uptime": 10,
            "total_space": 100,
            "ip": "127.0.0.1",
            "port": 8080
        });
        let payload: NodeRegisteredPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.version, 1);
        assert!(payload.tags.is_empty());
    }

    #[test]
    fn file_created_payload_round_trips() {
        let payload = FileCreatedPayload {
            user_id: UserId::try_from("a".repeat(64)).unwrap(),
            filename: Filename::try_from("notes.txt".to_string()).unwrap(),
            file_id: FileId::try_from("b".repeat(64)).unwrap(),
            mimetype: MimeType::try_from("text/plain".to_string()).unwrap(),
            size: 42,
            iv: vec![1, 2, 3, 4],
            authorized_users: vec![],
            version: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        let back: FileCreatedPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back.file_id, payload.file_id);
        assert_eq!(back.size, payload.size);
    }
}
