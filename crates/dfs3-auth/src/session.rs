//! Bearer session tokens minted after a successful challenge verification,
//! valid for 30 minutes. Uses the same TTL-cache mechanism as
//! [`crate::challenge::ChallengeStore`], keyed by the token string rather
//! than `user_id` since a bearer token is presented bare on every request.

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use dfs3_types::entities::SessionToken;
use dfs3_types::ids::UserId;

use dfs3_registry::cache::TtlLruCache;

const SESSION_CACHE_CAPACITY: usize = 10_000;
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

pub struct SessionStore {
    cache: Mutex<TtlLruCache<String, SessionToken>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(TtlLruCache::new(SESSION_CACHE_CAPACITY, Some(SESSION_TTL))),
        }
    }

    /// Mints a new 24-random-byte, base64-encoded session token for
    /// `user_id`.
    pub fn mint(&self, user_id: &UserId) -> SessionToken {
        let mut raw = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut raw);

        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let session = SessionToken {
            user_id: user_id.clone(),
            token: STANDARD.encode(raw),
            issued_at,
        };
        self.cache.lock().unwrap().put(session.token.clone(), session.clone());
        session
    }

    /// Resolves a bearer token back to the `user_id` it was issued for, if
    /// it exists and hasn't expired.
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        self.cache.lock().unwrap().get(&token.to_string()).map(|s| s.user_id)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
