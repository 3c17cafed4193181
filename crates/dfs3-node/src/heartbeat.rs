//! Periodic `node_status` publisher: every node announces its own
//! uptime, free space, and reachable address on an interval so peers'
//! registries never go stale between `node_registered` events.

use std::sync::Arc;
use std::time::Duration;

use dfs3_events::EventPublisher;
use dfs3_types::{EventType, NodeStatusPayload};
use tokio_util::sync::CancellationToken;

use crate::system;

/// Runs until `cancel` fires, publishing a `node_status` event every
/// `interval`. Intended to be spawned as its own long-lived task.
pub async fn run(
    publisher: Arc<EventPublisher>,
    interval: Duration,
    data_dir: String,
    port: u16,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("heartbeat task cancelled, exiting");
                return;
            }
            _ = ticker.tick() => {
                if let Err(e) = publish_status(&publisher, &data_dir, port).await {
                    tracing::warn!(error = %e, "failed to publish node_status");
                }
            }
        }
    }
}

async fn publish_status(
    publisher: &EventPublisher,
    data_dir: &str,
    port: u16,
) -> Result<dfs3_types::BlockId, dfs3_events::EventError> {
    let payload = NodeStatusPayload {
        uptime: system::uptime_seconds(),
        total_space: system::total_disk_space(data_dir),
        ip: system::local_ip(),
        port,
    };
    publisher.publish(EventType::NodeStatus, payload).await
}
