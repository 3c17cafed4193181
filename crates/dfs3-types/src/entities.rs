//! # Core Domain Entities
//!
//! Defines the persistent and wire records dfs3 operates on.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeRecord`, `UserRecord`
//! - **Files**: `FileMetadata`, `AuthorizedUserEntry`, `FileEntry`
//! - **Auth**: `Challenge`, `SessionToken`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::ids::{Alias, FileId, Hostname, MimeType, NodeId, Tag, UserId};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A node's public registration record, as derived from its
/// `node_registered`/`node_status` event history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub alias: Alias,
    pub hostname: Hostname,
    /// Base64-encoded Ed25519 public key.
    pub public_key: String,
    pub platform: String,
    pub software_version: String,
    pub uptime: u64,
    pub total_space: u64,
    pub ip: std::net::IpAddr,
    pub port: u16,
    pub tags: Vec<Tag>,
    /// Unix seconds, from the first `node_registered` event observed.
    pub creation_date: i64,
    pub version: u32,
    /// Unix seconds, bumped by every `node_registered`/`node_status` event.
    pub last_seen: i64,
}

/// The minimal per-node record returned by the node listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub node_id: NodeId,
    pub alias: Alias,
    pub public_key: String,
}

/// A registered user's public record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub alias: Alias,
    /// Base64-encoded Ed25519 public key.
    pub public_key: String,
    pub creation_date: i64,
}

// =============================================================================
// CLUSTER B: FILES
// =============================================================================

/// An authorization grant for one user over one file: the file's symmetric
/// content key, wrapped for that user's public key, plus its IV.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUserEntry {
    pub user_id: UserId,
    /// Base64-encoded, recipient-wrapped content encryption key.
    #[serde_as(as = "Bytes")]
    pub encrypted_key: Vec<u8>,
    /// Base64-encoded initialization vector for the recipient's wrapped key.
    #[serde_as(as = "Bytes")]
    pub iv: Vec<u8>,
}

/// Content-addressed file metadata, shared by every user holding an entry
/// that links to it. One record per `file_id`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_id: FileId,
    pub owner: UserId,
    pub mimetype: MimeType,
    pub size: u64,
    /// Base64-encoded content encryption IV, distinct from each
    /// authorized user's key-wrap IV.
    #[serde_as(as = "Bytes")]
    pub iv: Vec<u8>,
    pub creation_date: i64,
    /// Node ids known to hold a full copy of the ciphertext.
    pub replica_nodes: Vec<NodeId>,
    pub authorized_users: Vec<AuthorizedUserEntry>,
    pub version: u32,
}

/// A single user-visible directory listing row: one per filename entry
/// (hard link) the user holds, not one per `file_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub file_id: FileId,
    pub size: u64,
    pub mimetype: MimeType,
    pub creation_date: i64,
}

// =============================================================================
// CLUSTER C: AUTH
// =============================================================================

/// An outstanding login challenge for a user. At most one per user at a
/// time; issuing a new one evicts the prior.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub user_id: UserId,
    /// Base64 of 24 random bytes || 8-byte big-endian epoch seconds.
    pub value: String,
    pub issued_at: i64,
}

/// A minted session, valid for 30 minutes from issuance.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub user_id: UserId,
    /// Base64 of 24 random bytes.
    pub token: String,
    pub issued_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorized_user_entry_roundtrips_through_json() {
        let entry = AuthorizedUserEntry {
            user_id: UserId::try_from("a".repeat(64)).unwrap(),
            encrypted_key: vec![1, 2, 3, 4],
            iv: vec![5, 6, 7, 8],
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: AuthorizedUserEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.encrypted_key, entry.encrypted_key);
        assert_eq!(back.iv, entry.iv);
    }
}
