//! # Bus Announcements
//!
//! The only thing nodes broadcast over the pub/sub bus is a tiny pointer
//! into the ledger: enough for a peer to know a new event exists and go
//! fetch it. The event body itself always travels through the ledger,
//! never the bus, so a dropped or replayed bus message can never corrupt
//! state — at worst it causes a redundant ledger fetch.

use dfs3_types::{BlockId, EventType, NodeId};
use serde::{Deserialize, Serialize};

/// Wire format of a bus announcement.
///
/// Mirrors `MqttEventNotification` from the original implementation:
/// `{block_id, event_type, timestamp, node_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusAnnouncement {
    pub block_id: BlockId,
    pub event_type: EventType,
    pub timestamp: String,
    pub node_id: NodeId,
}

impl BusAnnouncement {
    pub fn new(block_id: BlockId, event_type: EventType, timestamp: String, node_id: NodeId) -> Self {
        Self {
            block_id,
            event_type,
            timestamp,
            node_id,
        }
    }
}
