//! # Bus Listener
//!
//! Consumes the MQTT event loop and turns incoming publishes into
//! [`BusAnnouncement`] values, discarding anything that doesn't parse
//! (mirrors `mqtt/listener.py: on_message`'s `ValidationError` handling).
//! What to do with a valid announcement (fetch the event from the ledger,
//! verify, dispatch) is the caller's job — this module only speaks bus
//! wire format.

use rumqttc::{Event, EventLoop, Incoming};
use tracing::{debug, warn};

use crate::events::BusAnnouncement;

/// Drives one MQTT connection's event loop, yielding announcements as
/// they arrive. Intended to run as its own long-lived task; reconnects
/// are handled transparently by `rumqttc`.
pub struct BusListener {
    eventloop: EventLoop,
}

impl BusListener {
    pub fn new(eventloop: EventLoop) -> Self {
        Self { eventloop }
    }

    /// Waits for the next announcement, looping past any non-publish
    /// broker events (ConnAck, PingResp, ...) and any message that fails
    /// to parse.
    pub async fn recv(&mut self) -> Option<BusAnnouncement> {
        loop {
            let notification = match self.eventloop.poll().await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "bus connection error, retrying");
                    continue;
                }
            };

            let Event::Incoming(Incoming::Publish(publish)) = notification else {
                continue;
            };

            match serde_json::from_slice::<BusAnnouncement>(&publish.payload) {
                Ok(announcement) => return Some(announcement),
                Err(e) => {
                    warn!(error = %e, "invalid bus announcement, discarding");
                    continue;
                }
            }
        }
    }
}

/// Listener side of the in-memory fake bus, wrapping a broadcast receiver
/// with the same filtering semantics as [`BusListener`] (lag is treated
/// as a reason to keep going, not a fatal error).
pub struct InMemoryListener {
    receiver: tokio::sync::broadcast::Receiver<BusAnnouncement>,
}

impl InMemoryListener {
    pub fn new(receiver: tokio::sync::broadcast::Receiver<BusAnnouncement>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Option<BusAnnouncement> {
        loop {
            match self.receiver.recv().await {
                Ok(announcement) => return Some(announcement),
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "bus listener lagged, some announcements dropped");
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{BusPublisher, InMemoryBus};
    use dfs3_types::{BlockId, EventType, NodeId};
    use std::convert::TryFrom;

    #[tokio::test]
    async fn in_memory_listener_receives_published_announcement() {
        let bus = InMemoryBus::new();
        let mut listener = InMemoryListener::new(bus.subscribe());

        let announcement = BusAnnouncement::new(
            BlockId::try_from("0x".to_string() + &"e".repeat(64)).unwrap(),
            EventType::FileShared,
            "2026-07-26T00:00:00Z".to_string(),
            NodeId::try_from("f".repeat(64)).unwrap(),
        );
        bus.publish(announcement.clone()).await.unwrap();

        let received = listener.recv().await.unwrap();
        assert_eq!(received, announcement);
    }
}
