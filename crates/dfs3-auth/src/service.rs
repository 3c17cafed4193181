//! Orchestrates the three-step login flow: request a challenge, sign and
//! verify it, mint a session. Mirrors the handlers in
//! `api/routes/auth.py`, minus the HTTP framing which belongs one layer
//! up in `dfs3-api`.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use dfs3_crypto::{Ed25519PublicKey, Ed25519Signature};
use dfs3_events::EventPublisher;
use dfs3_registry::UserRegistry;
use dfs3_types::events::{EventType, UserJoinedNodePayload};
use dfs3_types::ids::UserId;

use crate::challenge::ChallengeStore;
use crate::errors::AuthError;
use crate::session::SessionStore;

pub struct AuthService {
    users: Arc<UserRegistry>,
    challenges: ChallengeStore,
    sessions: SessionStore,
    publisher: Arc<EventPublisher>,
}

impl AuthService {
    pub fn new(users: Arc<UserRegistry>, publisher: Arc<EventPublisher>) -> Self {
        Self {
            users,
            challenges: ChallengeStore::new(),
            sessions: SessionStore::new(),
            publisher,
        }
    }

    /// `request_challenge(user_id)`: the user must already be known
    /// (registered via a `user_registered` event observed earlier).
    pub fn request_challenge(&self, user_id: &UserId) -> Result<String, AuthError> {
        if !self.users.exists(user_id)? {
            return Err(AuthError::UnknownUser(user_id.to_string()));
        }
        Ok(self.challenges.generate(user_id).value)
    }

    /// `verify(user_id, signature)`: checks the signature against the
    /// outstanding challenge and the user's registered public key, mints a
    /// session token, and emits `user_joined_node`. The signature covers
    /// the challenge's base64 string as the client received it, not the
    /// bytes it decodes to.
    pub async fn verify(&self, user_id: &UserId, signature_b64: &str) -> Result<String, AuthError> {
        let challenge = self
            .challenges
            .get(user_id)
            .ok_or_else(|| AuthError::ChallengeMissing(user_id.to_string()))?;

        let public_key_b64 = self
            .users
            .get_public_key(user_id)?
            .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))?;

        let signature_bytes = decode_signature(signature_b64)?;
        let public_key = decode_public_key(&public_key_b64)?;

        public_key
            .verify(challenge.value.as_bytes(), &signature_bytes)
            .map_err(|_| AuthError::InvalidSignature)?;

        let session = self.sessions.mint(user_id);

        let payload = UserJoinedNodePayload {
            user_id: user_id.clone(),
            challenge: challenge.value,
            public_key: public_key_b64,
            signature: STANDARD
                .decode(signature_b64)
                .map_err(|_| AuthError::InvalidSignature)?,
        };
        if let Err(e) = self.publisher.publish(EventType::UserJoinedNode, payload).await {
            tracing::warn!(error = %e, %user_id, "failed to publish user_joined_node event");
        }

        Ok(session.token)
    }

    /// `require_auth(bearer)`: resolves a bearer token to the `user_id` it
    /// was minted for.
    pub fn require_auth(&self, bearer: &str) -> Result<UserId, AuthError> {
        self.sessions.resolve(bearer).ok_or(AuthError::Unauthorized)
    }
}

fn decode_public_key(public_key_b64: &str) -> Result<Ed25519PublicKey, AuthError> {
    let bytes = STANDARD.decode(public_key_b64).map_err(|_| AuthError::InvalidSignature)?;
    let array: [u8; 32] = bytes.try_into().map_err(|_| AuthError::InvalidSignature)?;
    Ed25519PublicKey::from_bytes(array).map_err(|_| AuthError::InvalidSignature)
}

fn decode_signature(signature_b64: &str) -> Result<Ed25519Signature, AuthError> {
    let bytes = STANDARD.decode(signature_b64).map_err(|_| AuthError::InvalidSignature)?;
    let array: [u8; 64] = bytes.try_into().map_err(|_| AuthError::InvalidSignature)?;
    Ok(Ed25519Signature::from_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    use dfs3_bus::InMemoryBus;
    use dfs3_crypto::Ed25519KeyPair;
    use dfs3_ledger::InMemoryLedger;
    use dfs3_events::EventIndex;
    use dfs3_types::entities::UserRecord;
    use dfs3_types::ids::{Alias, NodeId};
    use rusqlite::Connection;

    fn service() -> (AuthService, Ed25519KeyPair, UserId) {
        let users = Arc::new(UserRegistry::open(Connection::open_in_memory().unwrap()).unwrap());
        let key_pair = Ed25519KeyPair::generate();
        let user_id = UserId::try_from("a".repeat(64)).unwrap();
        users
            .register(&UserRecord {
                user_id: user_id.clone(),
                alias: Alias::try_from("alice".to_string()).unwrap(),
                public_key: STANDARD.encode(key_pair.public_key().as_bytes()),
                creation_date: 1_700_000_000,
            })
            .unwrap();

        let ledger = Arc::new(InMemoryLedger::new());
        let bus = Arc::new(InMemoryBus::new());
        let index = Arc::new(EventIndex::open(Connection::open_in_memory().unwrap()).unwrap());
        let node_key_pair = Arc::new(Ed25519KeyPair::generate());
        let publisher = Arc::new(EventPublisher::new(
            ledger,
            bus,
            index,
            node_key_pair,
            NodeId::try_from("b".repeat(64)).unwrap(),
        ));

        (AuthService::new(users, publisher), key_pair, user_id)
    }

    #[tokio::test]
    async fn full_login_flow_succeeds() {
        let (service, key_pair, user_id) = service();

        let challenge = service.request_challenge(&user_id).unwrap();
        let signature = key_pair.sign(challenge.as_bytes());
        let signature_b64 = STANDARD.encode(signature.as_bytes());

        let token = service.verify(&user_id, &signature_b64).await.unwrap();
        assert_eq!(service.require_auth(&token).unwrap(), user_id);
    }

    #[tokio::test]
    async fn verify_without_a_challenge_fails() {
        let (service, key_pair, user_id) = service();
        let signature = key_pair.sign(b"whatever");
        let signature_b64 = STANDARD.encode(signature.as_bytes());

        let err = service.verify(&user_id, &signature_b64).await.unwrap_err();
        assert!(matches!(err, AuthError::ChallengeMissing(_)));
    }

    #[tokio::test]
    async fn verify_with_wrong_key_fails() {
        let (service, _key_pair, user_id) = service();
        let challenge = service.request_challenge(&user_id).unwrap();

        let wrong_key_pair = Ed25519KeyPair::generate();
        let signature = wrong_key_pair.sign(challenge.as_bytes());
        let signature_b64 = STANDARD.encode(signature.as_bytes());

        let err = service.verify(&user_id, &signature_b64).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn require_auth_rejects_unknown_bearer() {
        let (service, _key_pair, _user_id) = service();
        assert!(matches!(service.require_auth("garbage"), Err(AuthError::Unauthorized)));
    }

    #[test]
    fn request_challenge_rejects_unknown_user() {
        let (service, _key_pair, _user_id) = service();
        let unknown = UserId::try_from("f".repeat(64)).unwrap();
        assert!(matches!(service.request_challenge(&unknown), Err(AuthError::UnknownUser(_))));
    }
}
