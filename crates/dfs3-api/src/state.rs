//! Shared application state handed to every handler, composed once in
//! `dfs3-node`'s bootstrap and cloned cheaply (everything behind an
//! `Arc`) per request via axum's `State` extractor.

use std::sync::Arc;

use dfs3_auth::AuthService;
use dfs3_events::EventPublisher;
use dfs3_registry::{NodeRegistry, UserRegistry};
use dfs3_store::{BlobStore, FileMetadataStore, PeerFetcher};
use dfs3_types::ids::NodeId;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub publisher: Arc<EventPublisher>,
    pub event_index: Arc<dfs3_events::EventIndex>,
    pub nodes: Arc<NodeRegistry>,
    pub users: Arc<UserRegistry>,
    pub files: Arc<FileMetadataStore>,
    pub blobs: Arc<BlobStore>,
    pub fetcher: Arc<dyn PeerFetcher>,
    pub local_node_id: NodeId,
}
