//! The connection pool (§4.6): a mutex-protected collection of raw
//! `sqlx::postgres::PgConnection`s, deliberately not `sqlx::PgPool` — the
//! pool's idle/in-use bookkeeping, sizing, and broken-connection handling
//! are first-class parts of this project's design, not something to
//! delegate to the driver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tokio::sync::Mutex;

use crate::error::DataError;

pub const DEFAULT_INITIAL_SIZE: usize = 20;
pub const DEFAULT_MAX_SIZE: usize = 50;

struct PoolInner {
    idle: Vec<(u64, PgConnection)>,
    in_use: usize,
    total_opened: usize,
}

/// Shared pool state. Always held behind an `Arc` so a [`PooledConnection`]
/// can hand itself back on drop.
pub struct ConnectionPool {
    url: String,
    max_size: usize,
    next_conn_id: AtomicU64,
    inner: Mutex<PoolInner>,
}

impl ConnectionPool {
    /// Open `initial_size` connections up front and accept growth up to
    /// `max_size` on demand (§4.6: "initial size (20) and maximum size (50)").
    pub async fn connect(url: &str, initial_size: usize, max_size: usize) -> Result<Arc<Self>, DataError> {
        let next_conn_id = AtomicU64::new(0);
        let mut idle = Vec::with_capacity(initial_size);
        for _ in 0..initial_size {
            let conn = PgConnection::connect(url).await.map_err(DataError::database)?;
            let id = next_conn_id.fetch_add(1, Ordering::Relaxed);
            idle.push((id, conn));
        }
        let total_opened = idle.len();
        Ok(Arc::new(Self {
            url: url.to_string(),
            max_size,
            next_conn_id,
            inner: Mutex::new(PoolInner {
                idle,
                in_use: 0,
                total_opened,
            }),
        }))
    }

    /// Return an idle connection, open a fresh one if under `max_size`, or
    /// report exhaustion (§4.6: "otherwise return 'unavailable'"). The
    /// caller surfaces exhaustion the same way as any other SQL error (§5,
    /// §7: "Connection pool exhausted").
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledConnection, DataError> {
        {
            let mut inner = self.inner.lock().await;
            if let Some((id, conn)) = inner.idle.pop() {
                inner.in_use += 1;
                return Ok(PooledConnection {
                    pool: self.clone(),
                    id,
                    conn: Some(conn),
                });
            }
            if inner.total_opened >= self.max_size {
                return Err(DataError::Other("connection pool exhausted".into()));
            }
            inner.total_opened += 1;
            inner.in_use += 1;
        }

        // Open the new connection with the lock released — §5: "statement
        // compilation happens with the lock released and is idempotent";
        // the same principle applies here to opening a fresh connection.
        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        match PgConnection::connect(&self.url).await {
            Ok(conn) => Ok(PooledConnection {
                pool: self.clone(),
                id,
                conn: Some(conn),
            }),
            Err(e) => {
                let mut inner = self.inner.lock().await;
                inner.total_opened -= 1;
                inner.in_use -= 1;
                Err(DataError::database(e))
            }
        }
    }

    /// Return a connection to the idle set, or discard it if broken
    /// (§4.6: "if the connection reports a broken status, reset it").
    /// "Reset" here means discarding and letting a future `acquire` open a
    /// replacement, since a raw `PgConnection` has no in-place reset hook.
    async fn release(&self, id: u64, mut conn: PgConnection) {
        let broken = conn.ping().await.is_err();
        let mut inner = self.inner.lock().await;
        inner.in_use = inner.in_use.saturating_sub(1);
        if broken {
            inner.total_opened = inner.total_opened.saturating_sub(1);
            tracing::warn!(conn_id = id, "discarding broken pooled connection");
        } else {
            inner.idle.push((id, conn));
        }
    }

    /// Tear down every connection, idle or not yet returned. In-flight
    /// `PooledConnection`s still release normally; this only drains what's
    /// currently idle (§4.6: "close-all tears down every connection").
    pub async fn close_all(&self) {
        let mut inner = self.inner.lock().await;
        for (_, conn) in inner.idle.drain(..) {
            let _ = conn.close().await;
        }
        inner.total_opened = 0;
    }

    pub async fn idle_count(&self) -> usize {
        self.inner.lock().await.idle.len()
    }

    pub async fn in_use_count(&self) -> usize {
        self.inner.lock().await.in_use
    }
}

/// An acquired connection. Returned to the pool automatically when dropped
/// (via a detached task, since `Drop` cannot `.await`).
pub struct PooledConnection {
    pool: Arc<ConnectionPool>,
    id: u64,
    conn: Option<PgConnection>,
}

impl PooledConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn as_mut(&mut self) -> &mut PgConnection {
        self.conn.as_mut().expect("connection taken before drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let pool = self.pool.clone();
            let id = self.id;
            tokio::spawn(async move {
                pool.release(id, conn).await;
            });
        }
    }
}
