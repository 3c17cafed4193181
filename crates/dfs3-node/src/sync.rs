//! Seed-node catch-up: a brand new node has no history of events it
//! missed before coming online, so if a seed node is configured it asks
//! that node for its full event list and replays each one through the
//! same listener the live bus feeds, relying on the listener's own
//! `block_id` idempotency to make replay safe.

use std::sync::atomic::Ordering;
use std::time::Duration;

use dfs3_bus::BusAnnouncement;
use dfs3_ledger::LedgerClient;
use dfs3_events::EventListener;
use dfs3_types::{BlockId, EventType, NodeId};

use crate::error::NodeError;

/// Wire shape of one entry in a seed node's `GET /api/v1/events`
/// response. Deliberately not `dfs3_api::dto::EventEntry`: that type only
/// derives `Serialize`, since it is a response DTO, never a request body.
#[derive(Debug, serde::Deserialize)]
struct SeedEventEntry {
    block_id: BlockId,
    event_type: EventType,
    timestamp: i64,
    node_id: NodeId,
}

/// Fetches `seed_node_url`'s event list and replays each entry through
/// `listener`, skipping any the listener has already indexed.
pub async fn sync_from_seed<L: LedgerClient>(
    seed_node_url: &str,
    timeout: Duration,
    listener: &EventListener<L>,
) -> Result<usize, NodeError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let entries: Vec<SeedEventEntry> = client.get(seed_node_url).send().await?.json().await?;

    let count = entries.len();
    let seeding = listener.seeding_flag();
    seeding.store(true, Ordering::SeqCst);
    for entry in entries {
        let timestamp = chrono::DateTime::from_timestamp(entry.timestamp, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        let announcement = BusAnnouncement::new(entry.block_id, entry.event_type, timestamp, entry.node_id);
        listener.process(announcement).await;
    }
    seeding.store(false, Ordering::SeqCst);

    tracing::info!(seed_node_url, count, "replayed seed node event history");
    Ok(count)
}
