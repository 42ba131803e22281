//! The seam between a running script and the rest of the runtime.
//!
//! `webforge-script` has no dependency on `webforge-data` or the session
//! store directly — `webforge-runtime` implements this trait over its own
//! route index, connection pool, and session store, and hands an
//! `Arc<dyn ScriptHost>` down into the engine. Keeps the dependency graph a
//! DAG: runtime depends on script, never the other way around.

use serde_json::Value;

pub trait ScriptHost: Send + Sync {
    /// `sqlQuery(sql, params?)` — run a parameterized query against the
    /// shared connection pool. Returns `{"rows": [...]}` or an error
    /// message.
    fn sql_query(&self, sql: &str, params: &[Value]) -> Result<Value, String>;

    /// `findQuery(name)` — resolve a named query's SQL text from the route
    /// index, or `None` if no such query is registered.
    fn find_query(&self, name: &str) -> Option<String>;

    /// `getStore(key)` — read from the current session's store, or `None`
    /// if there's no session or no such key.
    fn get_store(&self, key: &str) -> Option<Value>;

    /// `setStore(key, value)` — upsert into the current session's store.
    /// Returns whether the write succeeded (e.g. `false` with no session).
    fn set_store(&self, key: &str, value: Value) -> bool;
}

/// A host with no session and no database — used for scripts executed
/// outside a request context (e.g. compile-time smoke tests).
pub struct NullHost;

impl ScriptHost for NullHost {
    fn sql_query(&self, _sql: &str, _params: &[Value]) -> Result<Value, String> {
        Err("no database available in this context".into())
    }

    fn find_query(&self, _name: &str) -> Option<String> {
        None
    }

    fn get_store(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set_store(&self, _key: &str, _value: Value) -> bool {
        false
    }
}
