//! Login challenges: a time-bounded, single-outstanding-per-user nonce a
//! client must sign with its private key to prove ownership of a
//! registered `user_id`. Grounded in `api/routes/auth.py`'s
//! `generate_challenge`/`get_challenge` pairing, with the exact byte
//! layout and TTL taken from the specification (`core/auth.py` itself was
//! never implemented in the original).

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use dfs3_types::entities::Challenge;
use dfs3_types::ids::UserId;

use dfs3_registry::cache::TtlLruCache;

const CHALLENGE_CACHE_CAPACITY: usize = 10_000;
const CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);

pub struct ChallengeStore {
    cache: Mutex<TtlLruCache<UserId, Challenge>>,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(TtlLruCache::new(CHALLENGE_CACHE_CAPACITY, Some(CHALLENGE_TTL))),
        }
    }

    /// Generates 24 random bytes, appends the current epoch seconds as an
    /// 8-byte big-endian suffix, and base64-encodes the result. Storing a
    /// new challenge for `user_id` evicts any prior one.
    pub fn generate(&self, user_id: &UserId) -> Challenge {
        let mut nonce = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut nonce);

        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let mut raw = Vec::with_capacity(32);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&issued_at.to_be_bytes());

        let challenge = Challenge {
            user_id: user_id.clone(),
            value: STANDARD.encode(&raw),
            issued_at,
        };
        self.cache.lock().unwrap().put(user_id.clone(), challenge.clone());
        challenge
    }

    pub fn get(&self, user_id: &UserId) -> Option<Challenge> {
        self.cache.lock().unwrap().get(user_id)
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn user(id: &str) -> UserId {
        UserId::try_from(id.repeat(64)).unwrap()
    }

    #[test]
    fn generate_then_get_round_trips() {
        let store = ChallengeStore::new();
        let user_id = user("a");
        let challenge = store.generate(&user_id);
        assert_eq!(store.get(&user_id).unwrap().value, challenge.value);
    }

    #[test]
    fn generating_again_evicts_the_prior_challenge() {
        let store = ChallengeStore::new();
        let user_id = user("b");
        let first = store.generate(&user_id);
        let second = store.generate(&user_id);
        assert_ne!(first.value, second.value);
        assert_eq!(store.get(&user_id).unwrap().value, second.value);
    }

    #[test]
    fn unknown_user_has_no_challenge() {
        let store = ChallengeStore::new();
        assert!(store.get(&user("c")).is_none());
    }
}
