//! The connection pool, prepared-statement cache, and row/JSON conversion
//! backing the static and dynamic SQL pipeline step executors (§4.6, §4.8).

pub mod error;
pub mod pool;
pub mod query;
pub mod rows;
pub mod statements;

pub use error::DataError;
pub use pool::{ConnectionPool, PooledConnection, DEFAULT_INITIAL_SIZE, DEFAULT_MAX_SIZE};
pub use query::{execute, stringify_param};
pub use statements::StatementCache;
