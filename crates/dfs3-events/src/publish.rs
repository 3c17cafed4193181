//! Event publishing: the build → sign → ledger-publish → bus-announce
//! half of the pipeline, grounded in `core/events.py`'s `build_base_event`/
//! `publish_event` and its per-type `send_*_event` wrappers. Where the
//! original builds one typed Pydantic event class per event type, this
//! collapses to a single generic [`EventPublisher::publish`] parameterized
//! by `event_type` and a `Serialize` payload, since `dfs3-types::events`
//! already gives each payload its own Rust type to serialize from.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use dfs3_bus::{BusAnnouncement, BusPublisher};
use dfs3_crypto::Ed25519KeyPair;
use dfs3_ledger::LedgerClient;
use dfs3_types::envelope::{EventEnvelope, PROTOCOL};
use dfs3_types::events::EventType;
use dfs3_types::ids::{BlockId, NodeId};

use crate::errors::EventError;
use crate::index::{EventIndex, EventIndexEntry};

/// Signs and publishes events on behalf of this node's own identity key.
/// Every event this node emits about itself or something it witnessed
/// goes through here so the ledger write, bus announcement and local
/// index entry stay in lockstep.
pub struct EventPublisher {
    ledger: Arc<dyn LedgerClient>,
    bus: Arc<dyn BusPublisher>,
    index: Arc<EventIndex>,
    key_pair: Arc<Ed25519KeyPair>,
    node_id: NodeId,
}

impl EventPublisher {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        bus: Arc<dyn BusPublisher>,
        index: Arc<EventIndex>,
        key_pair: Arc<Ed25519KeyPair>,
        node_id: NodeId,
    ) -> Self {
        Self {
            ledger,
            bus,
            index,
            key_pair,
            node_id,
        }
    }

    /// Builds a signed envelope for `event_type`/`payload`, publishes it to
    /// the ledger, records it in the local index, and announces it on the
    /// bus. Returns the ledger-assigned `block_id`.
    pub async fn publish(
        &self,
        event_type: EventType,
        payload: impl Serialize,
    ) -> Result<BlockId, EventError> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        let mut envelope = EventEnvelope {
            event_type,
            timestamp: timestamp.clone(),
            node_id: self.node_id.clone(),
            protocol: PROTOCOL.to_string(),
            payload: serde_json::to_value(payload)?,
            signature: String::new(),
        };

        let message = envelope.canonical_bytes().map_err(EventError::Serialization)?;
        let signature = self.key_pair.sign(&message);
        envelope.signature = STANDARD.encode(signature.as_bytes());

        let bytes = serde_json::to_vec(&envelope)?;
        let block_id = self.ledger.publish(&bytes).await?;

        self.index.record(&EventIndexEntry {
            block_id: block_id.clone(),
            event_type,
            timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                .map(|dt| dt.timestamp())
                .unwrap_or(0),
            node_id: self.node_id.clone(),
        })?;

        let announcement = BusAnnouncement::new(block_id.clone(), event_type, timestamp, self.node_id.clone());
        self.bus
            .publish(announcement)
            .await
            .map_err(EventError::Bus)?;

        Ok(block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    use dfs3_bus::InMemoryBus;
    use dfs3_ledger::InMemoryLedger;
    use dfs3_types::events::UserRegisteredPayload;
    use dfs3_types::ids::{Alias, UserId};
    use rusqlite::Connection;

    fn publisher() -> (EventPublisher, Arc<InMemoryBus>, Arc<InMemoryLedger>, Arc<EventIndex>) {
        let ledger = Arc::new(InMemoryLedger::new());
        let bus = Arc::new(InMemoryBus::new());
        let index = Arc::new(EventIndex::open(Connection::open_in_memory().unwrap()).unwrap());
        let key_pair = Arc::new(Ed25519KeyPair::generate());
        let node_id = NodeId::try_from("a".repeat(64)).unwrap();
        let publisher = EventPublisher::new(ledger.clone(), bus.clone(), index.clone(), key_pair, node_id);
        (publisher, bus, ledger, index)
    }

    #[tokio::test]
    async fn publish_signs_records_and_announces() {
        let (publisher, bus, ledger, index) = publisher();
        let mut rx = bus.subscribe();

        let payload = UserRegisteredPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            alias: Alias::try_from("alice".to_string()).unwrap(),
            public_key: "key".to_string(),
        };
        let block_id = publisher.publish(EventType::UserRegistered, payload).await.unwrap();

        assert!(index.contains(&block_id).unwrap());
        let envelope_bytes = ledger.fetch(&block_id).await.unwrap();
        let envelope: EventEnvelope = serde_json::from_slice(&envelope_bytes).unwrap();
        assert_eq!(envelope.event_type, EventType::UserRegistered);

        let announcement = rx.recv().await.unwrap();
        assert_eq!(announcement.block_id, block_id);
    }
}
