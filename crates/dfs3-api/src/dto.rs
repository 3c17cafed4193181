//! Request/response bodies for the HTTP boundary. These are wire shapes,
//! distinct from the domain types in `dfs3-types`: a few (like
//! `UploadFileMetadata`) carry fields the domain payload doesn't need, or
//! drop ones a client shouldn't have to send.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use dfs3_types::entities::AuthorizedUserEntry;
use dfs3_types::events::EventType;
use dfs3_types::ids::{Alias, BlockId, FileId, Filename, MimeType, NodeId, Tag, UserId};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_id: UserId,
    pub alias: Alias,
    /// Base64-encoded Ed25519 public key.
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub user_id: UserId,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub access_token: String,
}

/// The `metadata` part of a multipart upload. Mirrors the wire shape of
/// the original's `UploadFileMetadata`, including the explicit `owner`
/// field — the handler still requires `owner == <bearer token's user>`.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct UploadFileMetadata {
    pub file_id: FileId,
    pub filename: Filename,
    pub owner: UserId,
    pub size: u64,
    #[serde_as(as = "Bytes")]
    pub iv: Vec<u8>,
    pub sha256: FileId,
    pub mimetype: MimeType,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub authorized_users: Vec<AuthorizedUserEntry>,
}

#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ShareFileRequest {
    pub file_id: FileId,
    pub filename: Filename,
    pub authorized_users: Vec<AuthorizedUserEntry>,
}

#[derive(Debug, Serialize)]
pub struct ShareFileResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub new_name: Filename,
}

#[derive(Debug, Serialize)]
pub struct SimpleStatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EventEntry {
    pub block_id: BlockId,
    pub event_type: EventType,
    pub timestamp: i64,
    pub node_id: NodeId,
}

impl From<dfs3_events::EventIndexEntry> for EventEntry {
    fn from(e: dfs3_events::EventIndexEntry) -> Self {
        Self {
            block_id: e.block_id,
            event_type: e.event_type,
            timestamp: e.timestamp,
            node_id: e.node_id,
        }
    }
}
