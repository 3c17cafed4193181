//! Signature verification for incoming event envelopes.
//!
//! Every event is signed by the emitting node's own identity key. For
//! most event types the verifying key comes from the node registry — but
//! `node_registered` is self-describing: it carries the public key being
//! registered right in the payload, so it must verify against that
//! embedded key rather than a registry lookup that cannot yet exist, since
//! the node that's registering isn't in the registry yet.
//!
//! `user_registered` does NOT get this exception: it is always published
//! by a node on a user's behalf, signed with the publishing node's own
//! key, so it verifies the same way as any other non-bootstrap event.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use dfs3_crypto::{Ed25519PublicKey, Ed25519Signature};
use dfs3_registry::NodeRegistry;
use dfs3_types::envelope::EventEnvelope;
use dfs3_types::events::EventType;

use crate::errors::EventError;

/// Verifies `envelope`'s signature, resolving the verifying key from
/// `registry` unless the event type carries its own key.
pub fn verify_envelope(envelope: &EventEnvelope, registry: &NodeRegistry) -> Result<(), EventError> {
    let public_key_b64 = match envelope.event_type {
        EventType::NodeRegistered => embedded_public_key(envelope)?,
        _ => registry
            .get_public_key(&envelope.node_id)?
            .ok_or_else(|| EventError::UnknownSigner(envelope.node_id.to_string()))?,
    };

    verify_with_key(envelope, &public_key_b64)
}

fn embedded_public_key(envelope: &EventEnvelope) -> Result<String, EventError> {
    envelope
        .payload
        .get("public_key")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| EventError::UnknownSigner(envelope.node_id.to_string()))
}

fn verify_with_key(envelope: &EventEnvelope, public_key_b64: &str) -> Result<(), EventError> {
    let key_bytes = STANDARD
        .decode(public_key_b64)
        .map_err(|_| EventError::InvalidSignature(envelope.node_id.to_string()))?;
    let key_array: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| EventError::InvalidSignature(envelope.node_id.to_string()))?;
    let public_key = Ed25519PublicKey::from_bytes(key_array)
        .map_err(|_| EventError::InvalidSignature(envelope.node_id.to_string()))?;

    let sig_bytes = STANDARD
        .decode(&envelope.signature)
        .map_err(|_| EventError::InvalidSignature(envelope.node_id.to_string()))?;
    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| EventError::InvalidSignature(envelope.node_id.to_string()))?;
    let signature = Ed25519Signature::from_bytes(sig_array);

    let message = envelope
        .canonical_bytes()
        .map_err(EventError::Serialization)?;

    public_key
        .verify(&message, &signature)
        .map_err(|_| EventError::InvalidSignature(envelope.node_id.to_string()))
}
