//! The runtime's shared state (§4.5, §4.6): a `Site`'s route index plus
//! every per-process resource a request needs to execute its pipeline —
//! the connection pool, prepared-statement cache, transform/script caches,
//! and session store. One `RuntimeContext` is built at startup and shared
//! (behind an `Arc`) across every request the server handles.

use std::sync::Arc;

use serde_json::Value;
use webforge_core::ast::Site;
use webforge_data::pool::ConnectionPool;
use webforge_data::statements::StatementCache;
use webforge_script::engine::ScriptEngine;
use webforge_script::host::ScriptHost;
use webforge_transform::TransformCache;

use crate::index::RouteIndex;
use crate::session::SessionStore;

pub struct RuntimeContext {
    pub site: Site,
    pub index: RouteIndex,
    pub pool: Option<Arc<ConnectionPool>>,
    pub statements: StatementCache,
    pub transform_cache: TransformCache,
    pub script_engine: ScriptEngine,
    pub sessions: SessionStore,
}

impl RuntimeContext {
    pub fn new(site: Site, pool: Option<Arc<ConnectionPool>>) -> Arc<Self> {
        let index = RouteIndex::build(&site);
        Arc::new(Self {
            site,
            index,
            pool,
            statements: StatementCache::new(),
            transform_cache: TransformCache::new(),
            script_engine: ScriptEngine::new(),
            sessions: SessionStore::new(),
        })
    }
}

/// Bridges a script's synchronous `sqlQuery`/`findQuery`/`getStore`/
/// `setStore` calls into the async connection pool and session store.
///
/// `ScriptHost`'s methods are synchronous because `mlua`'s Lua-callable
/// functions for these four are plain (non-async) `create_function`
/// closures — only `fetch` needs `create_async_function`, since only
/// `fetch` talks to the network through `reqwest` directly inside the Lua
/// call. Blocking on the pool's async `acquire`/`execute` from inside a
/// Lua callback is safe here because the callback itself runs inside an
/// `eval_async`/`call_async` future that the dispatcher drives from a
/// multi-threaded Tokio runtime: `block_in_place` hands this worker
/// thread's other queued work to another thread for the duration of the
/// blocking call, so it cannot deadlock the runtime the way it would on a
/// single-threaded executor.
pub struct HostBridge {
    rt: Arc<RuntimeContext>,
    session_id: Option<String>,
}

impl HostBridge {
    pub fn new(rt: Arc<RuntimeContext>, session_id: Option<String>) -> Self {
        Self { rt, session_id }
    }
}

impl ScriptHost for HostBridge {
    fn sql_query(&self, sql: &str, params: &[Value]) -> Result<Value, String> {
        let Some(pool) = self.rt.pool.clone() else {
            return Err("no database available in this context".into());
        };
        let sql = sql.to_string();
        let params = params.to_vec();
        let statements = &self.rt.statements;
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut conn = pool.acquire().await.map_err(|e| e.to_string())?;
                webforge_data::query::execute(&mut conn, statements, &sql, &params)
                    .await
                    .map_err(|e| e.to_string())
            })
        })
    }

    fn find_query(&self, name: &str) -> Option<String> {
        self.rt.index.named_query(name).map(|q| q.sql.clone())
    }

    fn get_store(&self, key: &str) -> Option<Value> {
        self.rt.sessions.get(self.session_id.as_deref(), key)
    }

    fn set_store(&self, key: &str, value: Value) -> bool {
        self.rt.sessions.set(self.session_id.as_deref(), key, value)
    }
}

impl RuntimeContext {
    /// Build a fresh `ScriptHost` bound to this request's session. A new
    /// `HostBridge` per script step is cheap — it's an `Arc` clone plus an
    /// owned `Option<String>` — and keeps the host's session binding
    /// scoped to the request instead of threading it through every call.
    pub fn host_for_session(self: &Arc<Self>, session_id: Option<String>) -> Arc<dyn ScriptHost> {
        Arc::new(HostBridge::new(self.clone(), session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_no_database_configured() {
        let rt = RuntimeContext::new(Site::default(), None);
        assert!(rt.pool.is_none());
    }

    #[test]
    fn host_bridge_reports_no_database_without_a_pool() {
        let rt = RuntimeContext::new(Site::default(), None);
        let host = rt.host_for_session(None);
        let err = host.sql_query("SELECT 1", &[]).unwrap_err();
        assert!(err.contains("no database"));
    }

    #[test]
    fn host_bridge_proxies_session_store() {
        let rt = RuntimeContext::new(Site::default(), None);
        let host = rt.host_for_session(Some("sess-1".into()));
        assert!(host.set_store("k", serde_json::json!(1)));
        assert_eq!(host.get_store("k"), Some(serde_json::json!(1)));

        let other = rt.host_for_session(Some("sess-2".into()));
        assert_eq!(other.get_store("k"), None);
    }
}
