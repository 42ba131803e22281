//! Data-layer errors (§7: "SQL execution error", "Connection pool exhausted").
//!
//! Shaped after the teacher's `r2e-data::error::DataError`: a small, closed
//! set of variants rather than a passthrough of `sqlx::Error`, so callers up
//! in `webforge-runtime` can match on intent (not found vs. a driver error)
//! without reaching into `sqlx`.

#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Wrap any error type as a `Database` variant. Used when bubbling up a
    /// `sqlx::Error` from connection, prepare, or execute calls.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "not found: {msg}"),
            DataError::Database(err) => write!(f, "database error: {err}"),
            DataError::Other(msg) => write!(f, "data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
