//! # dfs3-bus
//!
//! Pub/sub announcement layer sitting above the distributed ledger. A
//! node publishes a tiny `(block_id, event_type, timestamp, node_id)`
//! pointer every time it writes an event to the ledger; peers subscribe
//! with a durable session and react by fetching and processing the full
//! event from the ledger themselves.
//!
//! Because the announcement carries no event data, a replayed or
//! duplicate delivery is harmless — the ingestion pipeline in
//! `dfs3-events` is idempotent per `block_id`.

pub mod errors;
pub mod events;
pub mod publisher;
pub mod subscriber;

pub use errors::BusError;
pub use events::BusAnnouncement;
pub use publisher::{BusPublisher, InMemoryBus, MqttBusClient};
pub use subscriber::{BusListener, InMemoryListener};

/// Single network topic all nodes publish to and subscribe from.
pub const BUS_TOPIC: &str = "dfs3/events";
