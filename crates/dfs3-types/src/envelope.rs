//! # Event Envelope
//!
//! The signed wrapper around every dfs3 domain event, published to the
//! ledger and announced over the bus. Unlike a request/response IPC
//! envelope, dfs3 events are fire-and-forget broadcasts: there is no
//! `recipient_id`, `correlation_id` or `reply_to`, only an emitter and a
//! signature over everything else.

use serde::{Deserialize, Serialize};

use crate::events::EventType;
use crate::ids::NodeId;

/// The current wire protocol identifier, carried on every envelope.
pub const PROTOCOL: &str = "dfs3/1.0";

/// A signed domain event, as published to the ledger.
///
/// `payload` is kept as a raw JSON value here: the concrete shape depends
/// on `event_type`, and handlers in `dfs3-events` deserialize it into the
/// matching typed payload from [`crate::events`] once they know which one
/// applies. This mirrors the wire format, where `payload` really is
/// "whatever the event type says it is".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: EventType,
    /// RFC 3339 timestamp, e.g. `2026-07-26T10:00:00Z`.
    pub timestamp: String,
    pub node_id: NodeId,
    pub protocol: String,
    pub payload: serde_json::Value,
    /// Base64-encoded Ed25519 signature over the canonical form of every
    /// other field.
    pub signature: String,
}

impl EventEnvelope {
    /// Builds the canonical JSON bytes to sign/verify: every field except
    /// `signature`, serialized with lexicographically sorted keys and no
    /// insignificant whitespace.
    ///
    /// `serde_json`'s default `Map` backend is a `BTreeMap`, so serializing
    /// a `Value::Object` already yields keys in sorted order; this only has
    /// to round-trip through `Value` to drop the `signature` field first.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("signature");
        }
        serde_json::to_vec(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::UserRegisteredPayload;
    use crate::ids::{Alias, UserId};

    fn sample_envelope() -> EventEnvelope {
        let payload = UserRegisteredPayload {
            user_id: UserId::try_from("b".repeat(64)).unwrap(),
            alias: Alias::try_from("alice".to_string()).unwrap(),
            public_key: "QQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQ=".to_string(),
        };
        EventEnvelope {
            event_type: EventType::UserRegistered,
            timestamp: "2026-07-26T10:00:00Z".to_string(),
            node_id: NodeId::try_from("a".repeat(64)).unwrap(),
            protocol: PROTOCOL.to_string(),
            payload: serde_json::to_value(payload).unwrap(),
            signature: "placeholder".to_string(),
        }
    }

    #[test]
    fn canonical_bytes_excludes_signature_and_is_deterministic() {
        let envelope = sample_envelope();
        let bytes_a = envelope.canonical_bytes().unwrap();
        let bytes_b = envelope.canonical_bytes().unwrap();
        assert_eq!(bytes_a, bytes_b);
        let text = String::from_utf8(bytes_a).unwrap();
        assert!(!text.contains("signature"));
        assert!(!text.contains(' '), "canonical form must drop whitespace");
    }

    #[test]
    fn canonical_bytes_changes_when_payload_changes() {
        let mut envelope = sample_envelope();
        let original = envelope.canonical_bytes().unwrap();
        envelope.payload["alias"] = serde_json::Value::String("bob".to_string());
        let changed = envelope.canonical_bytes().unwrap();
        assert_ne!(original, changed);
    }
}
