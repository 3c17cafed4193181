//! # Bus Publisher
//!
//! Publishing side of the pub/sub bus: broadcasts a [`BusAnnouncement`]
//! to the single network topic with QoS 1 so a dropped connection still
//! redelivers on reconnect (mirrors `mqtt/client.py: publish_event`).

use async_trait::async_trait;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use tracing::{debug, warn};

use crate::events::BusAnnouncement;
use crate::BusError;

/// Trait for publishing announcements to the bus.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, announcement: BusAnnouncement) -> Result<(), BusError>;
}

/// MQTT-backed publisher. One long-lived client per node, reused across
/// publishes; `rumqttc` handles reconnection internally.
pub struct MqttBusClient {
    client: AsyncClient,
    topic: String,
}

impl MqttBusClient {
    /// Connects a new client and spawns its event loop on the current
    /// Tokio runtime. `client_id` should be the node's `node_id`, so the
    /// broker can maintain a durable (clean_session=false) subscription
    /// for it.
    pub fn connect(broker_host: &str, broker_port: u16, client_id: &str, topic: &str) -> (Self, rumqttc::EventLoop) {
        let mut options = MqttOptions::new(client_id, broker_host, broker_port);
        options.set_clean_session(false);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, eventloop) = AsyncClient::new(options, 64);
        (
            Self {
                client,
                topic: topic.to_string(),
            },
            eventloop,
        )
    }

    pub async fn subscribe(&self) -> Result<(), BusError> {
        self.client
            .subscribe(&self.topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BusError::Connection(e.to_string()))
    }
}

#[async_trait]
impl BusPublisher for MqttBusClient {
    async fn publish(&self, announcement: BusAnnouncement) -> Result<(), BusError> {
        let payload = serde_json::to_vec(&announcement).map_err(|e| BusError::Encoding(e.to_string()))?;
        self.client
            .publish(&self.topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        debug!(block_id = %announcement.block_id, "announcement published");
        Ok(())
    }
}

/// In-memory fake used by integration tests and single-process dev runs.
/// Mirrors the teacher's `InMemoryEventBus`: a `tokio::sync::broadcast`
/// channel with no network hop.
pub struct InMemoryBus {
    sender: tokio::sync::broadcast::Sender<BusAnnouncement>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BusAnnouncement> {
        self.sender.subscribe()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusPublisher for InMemoryBus {
    async fn publish(&self, announcement: BusAnnouncement) -> Result<(), BusError> {
        match self.sender.send(announcement) {
            Ok(receivers) => {
                debug!(receivers, "announcement published in-memory");
                Ok(())
            }
            Err(_) => {
                warn!("announcement dropped, no subscribers");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfs3_types::{BlockId, EventType, NodeId};
    use std::convert::TryFrom;

    fn sample() -> BusAnnouncement {
        BusAnnouncement::new(
            BlockId::try_from("0x".to_string() + &"c".repeat(64)).unwrap(),
            EventType::NodeStatus,
            "2026-07-26T00:00:00Z".to_string(),
            NodeId::try_from("d".repeat(64)).unwrap(),
        )
    }

    #[tokio::test]
    async fn in_memory_bus_delivers_to_subscriber() {
        let bus = InMemoryBus::new();
        let mut rx = bus.subscribe();
        bus.publish(sample()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received, sample());
    }

    #[tokio::test]
    async fn in_memory_bus_publish_without_subscribers_is_ok() {
        let bus = InMemoryBus::new();
        assert!(bus.publish(sample()).await.is_ok());
    }
}
