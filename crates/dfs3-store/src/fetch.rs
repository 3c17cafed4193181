//! Multi-peer fetch engine for the download path: when a file isn't held
//! locally, race fetches against every node listed as holding a replica
//! and keep the first to answer, cancelling the rest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use dfs3_types::{FileId, NodeId};

use crate::errors::StoreError;
use crate::ports::NodeLocator;

/// Per-peer timeout for the download-path race, per the documented ~5s
/// bound.
pub const PEER_RACE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a single targeted clone fetch (background replication,
/// not user-facing), matching the original's `requests.get(..., timeout=10)`.
pub const CLONE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch(&self, node_id: &NodeId, file_id: &FileId, timeout: Duration) -> Result<Vec<u8>, StoreError>;
}

/// Fetches a file's ciphertext from a peer's `GET /api/v1/files/{id}/data`
/// endpoint, the same unauthenticated blob route this node itself serves.
pub struct HttpPeerFetcher<L> {
    client: Client,
    locator: Arc<L>,
}

impl<L: NodeLocator> HttpPeerFetcher<L> {
    pub fn new(locator: Arc<L>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .build()
            .map_err(|e| StoreError::Fetch(e.to_string()))?;
        Ok(Self { client, locator })
    }
}

#[async_trait]
impl<L: NodeLocator> PeerFetcher for HttpPeerFetcher<L> {
    async fn fetch(&self, node_id: &NodeId, file_id: &FileId, timeout: Duration) -> Result<Vec<u8>, StoreError> {
        let url = self
            .locator
            .file_url(node_id, file_id)
            .await?
            .ok_or_else(|| StoreError::Fetch(format!("no known address for node {node_id}")))?;

        let response = tokio::time::timeout(timeout, self.client.get(&url).send())
            .await
            .map_err(|_| StoreError::Fetch(format!("timed out fetching {file_id} from {node_id}")))?
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Fetch(format!(
                "node {node_id} returned {} for {file_id}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| StoreError::Fetch(e.to_string()))
    }
}

/// Races a fetch against every candidate replica node concurrently and
/// returns the first successful response, dropping the rest of the
/// `JoinHandle`s (which aborts them) once a winner is found.
pub async fn race_fetch(
    fetcher: Arc<dyn PeerFetcher>,
    candidates: &[NodeId],
    file_id: &FileId,
    per_peer_timeout: Duration,
) -> Result<Vec<u8>, StoreError> {
    if candidates.is_empty() {
        return Err(StoreError::NoReplicaAvailable(file_id.to_string()));
    }

    let mut handles = Vec::with_capacity(candidates.len());
    for node_id in candidates {
        let fetcher = Arc::clone(&fetcher);
        let node_id = node_id.clone();
        let file_id = file_id.clone();
        handles.push(tokio::spawn(async move {
            fetcher.fetch(&node_id, &file_id, per_peer_timeout).await
        }));
    }

    let mut last_err = None;
    let mut remaining = handles;
    while !remaining.is_empty() {
        let (result, _index, rest) = futures_select(remaining).await;
        remaining = rest;
        match result {
            Ok(Ok(bytes)) => return Ok(bytes),
            Ok(Err(e)) => last_err = Some(e),
            Err(_join_err) => last_err = Some(StoreError::Fetch("peer fetch task panicked".into())),
        }
    }

    Err(last_err.unwrap_or_else(|| StoreError::NoReplicaAvailable(file_id.to_string())))
}

/// `futures::future::select_all` reimplemented over `JoinHandle`s without
/// adding a `futures` dependency: polls every handle and returns as soon
/// as one resolves.
async fn futures_select(
    mut handles: Vec<tokio::task::JoinHandle<Result<Vec<u8>, StoreError>>>,
) -> (
    Result<Result<Vec<u8>, StoreError>, tokio::task::JoinError>,
    usize,
    Vec<tokio::task::JoinHandle<Result<Vec<u8>, StoreError>>>,
) {
    use std::future::{poll_fn, Future};
    use std::task::Poll;

    let (index, result) = poll_fn(|cx| {
        for (i, handle) in handles.iter_mut().enumerate() {
            if let Poll::Ready(result) = std::pin::Pin::new(handle).poll(cx) {
                return Poll::Ready((i, result));
            }
        }
        Poll::Pending
    })
    .await;

    let winner = handles.remove(index);
    drop(winner);
    (result, index, handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFetcher {
        delay: Duration,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PeerFetcher for StubFetcher {
        async fn fetch(&self, _node_id: &NodeId, _file_id: &FileId, _timeout: Duration) -> Result<Vec<u8>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(StoreError::Fetch("stub failure".into()))
            } else {
                Ok(b"payload".to_vec())
            }
        }
    }

    fn node(id: &str) -> NodeId {
        NodeId::try_from(id.repeat(64)).unwrap()
    }

    #[tokio::test]
    async fn race_returns_the_fastest_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher: Arc<dyn PeerFetcher> = Arc::new(StubFetcher {
            delay: Duration::from_millis(5),
            fail: false,
            calls: calls.clone(),
        });
        let file_id = FileId::try_from("a".repeat(64)).unwrap();
        let candidates = vec![node("b"), node("c")];

        let result = race_fetch(fetcher, &candidates, &file_id, Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), b"payload".to_vec());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn race_with_no_candidates_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher: Arc<dyn PeerFetcher> = Arc::new(StubFetcher {
            delay: Duration::from_millis(1),
            fail: false,
            calls,
        });
        let file_id = FileId::try_from("a".repeat(64)).unwrap();

        let result = race_fetch(fetcher, &[], &file_id, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(StoreError::NoReplicaAvailable(_))));
    }
}
