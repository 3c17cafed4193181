//! # dfs3-store
//!
//! File metadata and user-visible entries, content-addressed ciphertext
//! blobs, and the multi-peer fetch/clone engine that keeps replicas in
//! sync across nodes.

pub mod blob;
pub mod clone;
pub mod errors;
pub mod fetch;
pub mod metadata;
pub mod ports;

pub use blob::{BlobStore, MAX_FILE_SIZE};
pub use clone::{CloneEligibility, ClonePolicy, NodeCandidate};
pub use errors::StoreError;
pub use fetch::{race_fetch, HttpPeerFetcher, PeerFetcher, CLONE_FETCH_TIMEOUT, PEER_RACE_TIMEOUT};
pub use metadata::FileMetadataStore;
pub use ports::{NodeLocator, ReplicationAnnouncer};
