//! Prepared-statement cache (§4.6): maps `(connection, SQL text)` to a
//! generated statement name, unique across the process.
//!
//! The actual server-side `PREPARE` is delegated to `sqlx`'s own per-
//! connection statement cache (every `sqlx::query` is persistent by
//! default), which is the idiomatic way to get exactly the "first use
//! compiles, later uses reuse" behavior §4.6 describes without hand-rolling
//! the Postgres extended-query protocol ourselves. This cache is the local
//! bookkeeping layer on top: it gives the rest of the runtime (and its
//! tests) a name to log and a way to observe "was this the first use on
//! this connection" without talking to a real database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use webforge_core::index::fnv1a;

#[derive(Default)]
pub struct StatementCache {
    entries: Mutex<HashMap<(u64, u64), String>>,
    counter: AtomicU64,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the statement name registered for `(conn_id, sql)`, minting a
    /// process-unique one on first use. The second element of the tuple is
    /// `true` exactly on the call that minted a new entry — callers use
    /// this to decide whether to log a "preparing" event.
    pub fn get_or_register(&self, conn_id: u64, sql: &str) -> (String, bool) {
        let key = (conn_id, fnv1a(sql.as_bytes()));
        let mut entries = self.entries.lock().unwrap();
        if let Some(name) = entries.get(&key) {
            return (name.clone(), false);
        }
        // Process id + monotonic counter, matching "unique across the
        // process (counter + backend process identifier)" from §4.6 — we
        // use the OS process id as the identifier since a raw `PgConnection`
        // doesn't expose the Postgres backend pid through `sqlx`'s public API.
        let name = format!(
            "wf_stmt_{}_{}",
            std::process::id(),
            self.counter.fetch_add(1, Ordering::Relaxed)
        );
        entries.insert(key, name.clone());
        (name, true)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_connection_same_sql_compiles_once() {
        let cache = StatementCache::new();
        let (name_a, first_a) = cache.get_or_register(1, "SELECT 1");
        let (name_b, first_b) = cache.get_or_register(1, "SELECT 1");
        assert!(first_a);
        assert!(!first_b);
        assert_eq!(name_a, name_b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn same_sql_on_different_connections_compiles_once_each() {
        let cache = StatementCache::new();
        let (name_1, first_1) = cache.get_or_register(1, "SELECT 1");
        let (name_2, first_2) = cache.get_or_register(2, "SELECT 1");
        assert!(first_1);
        assert!(first_2);
        assert_ne!(name_1, name_2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn distinct_sql_on_same_connection_compiles_separately() {
        let cache = StatementCache::new();
        cache.get_or_register(1, "SELECT 1");
        cache.get_or_register(1, "SELECT 2");
        assert_eq!(cache.len(), 2);
    }
}
