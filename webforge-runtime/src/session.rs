//! Per-session key-value store backing `getStore`/`setStore` (§4.9).
//!
//! Generalized from `r2e_cache::TtlCache<K, V>` — the teacher's only cache
//! primitive — from a single flat TTL map into one keyed by `(session_id,
//! key)`, since the store is scoped to "the current session", not the whole
//! process. Session/auth flows themselves remain out of scope (§1); this
//! only backs the two script library functions that read and write a
//! session-scoped bag of values.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<(String, String), (Value, Instant)>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// `getStore(key)` for `session_id` — `None` if there's no session
    /// (`session_id` is `None`) or no such key, expired or not (§4.9).
    pub fn get(&self, session_id: Option<&str>, key: &str) -> Option<Value> {
        let session_id = session_id?;
        let map_key = (session_id.to_string(), key.to_string());
        if let Some(entry) = self.inner.get(&map_key) {
            let (value, inserted) = entry.value();
            if inserted.elapsed() < self.ttl {
                return Some(value.clone());
            }
            drop(entry);
            self.inner.remove(&map_key);
        }
        None
    }

    /// `setStore(key, value)` — returns whether the write succeeded; fails
    /// only when there is no session to scope the write to.
    pub fn set(&self, session_id: Option<&str>, key: &str, value: Value) -> bool {
        let Some(session_id) = session_id else {
            return false;
        };
        self.inner
            .insert((session_id.to_string(), key.to_string()), (value, Instant::now()));
        true
    }

    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.inner.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_a_value_for_a_session() {
        let store = SessionStore::new();
        assert!(store.set(Some("sess-1"), "cart", json!([1, 2, 3])));
        assert_eq!(store.get(Some("sess-1"), "cart"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn distinct_sessions_do_not_share_keys() {
        let store = SessionStore::new();
        store.set(Some("a"), "k", json!(1));
        store.set(Some("b"), "k", json!(2));
        assert_eq!(store.get(Some("a"), "k"), Some(json!(1)));
        assert_eq!(store.get(Some("b"), "k"), Some(json!(2)));
    }

    #[test]
    fn no_session_fails_both_read_and_write() {
        let store = SessionStore::new();
        assert!(!store.set(None, "k", json!(1)));
        assert_eq!(store.get(None, "k"), None);
    }

    #[test]
    fn missing_key_is_none() {
        let store = SessionStore::new();
        store.set(Some("a"), "k", json!(1));
        assert_eq!(store.get(Some("a"), "other"), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_access() {
        let store = SessionStore::with_ttl(Duration::from_millis(1));
        store.set(Some("a"), "k", json!(1));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.get(Some("a"), "k"), None);
    }
}
