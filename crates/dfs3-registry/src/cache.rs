//! Read-through cache generalizing the two caching strategies the original
//! registries used: `cachetools.LRUCache` (pure capacity bound, no
//! expiry) for nodes, `cachetools.TTLCache` (capacity bound *and* expiry)
//! for users. Both are the same structure here, with `ttl: None` recovering
//! the pure-LRU behavior.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlLruCache<K: Eq + Hash, V: Clone> {
    inner: LruCache<K, Entry<V>>,
    ttl: Option<Duration>,
}

impl<K: Eq + Hash, V: Clone> TtlLruCache<K, V> {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: LruCache::new(capacity),
            ttl,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match (self.ttl, self.inner.peek(key)) {
            (Some(ttl), Some(entry)) => entry.inserted_at.elapsed() > ttl,
            _ => false,
        };
        if expired {
            self.inner.pop(key);
            return None;
        }
        self.inner.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&mut self, key: K, value: V) {
        self.inner.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&mut self, key: &K) {
        self.inner.pop(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_lru_never_expires_entries() {
        let mut cache: TtlLruCache<String, u32> = TtlLruCache::new(2, None);
        cache.put("a".into(), 1);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn ttl_cache_expires_after_configured_duration() {
        let mut cache: TtlLruCache<String, u32> = TtlLruCache::new(4, Some(Duration::from_millis(10)));
        cache.put("a".into(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let mut cache: TtlLruCache<u32, u32> = TtlLruCache::new(1, None);
        cache.put(1, 100);
        cache.put(2, 200);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(200));
    }

    #[test]
    fn invalidate_forces_a_cache_miss() {
        let mut cache: TtlLruCache<String, u32> = TtlLruCache::new(4, None);
        cache.put("a".into(), 1);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
    }
}
