//! Parameterized query execution shared by the static and dynamic SQL step
//! executors (§4.8, §6).

use serde_json::{json, Value};

use crate::error::DataError;
use crate::pool::PooledConnection;
use crate::rows::row_to_json;
use crate::statements::StatementCache;

/// Stringify one JSON value the way §4.8 specifies: "string as-is; integer
/// without decimal; other JSON types by compact serialization". All
/// parameters travel to Postgres as text and rely on the column's implicit
/// cast, matching the wire contract's "positional placeholders `$1`, `$2`".
pub fn stringify_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() => n.as_i64().unwrap().to_string(),
        Value::Number(n) if n.is_u64() => n.as_u64().unwrap().to_string(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Execute `sql` with `params` against a pooled connection, shaping the
/// result as `{"rows": [...]}` (§4.8). Any failure here is what the SQL
/// step executors turn into the "step returns null" contract of §7.
pub async fn execute(
    conn: &mut PooledConnection,
    statements: &StatementCache,
    sql: &str,
    params: &[Value],
) -> Result<Value, DataError> {
    let (stmt_name, first_use) = statements.get_or_register(conn.id(), sql);
    if first_use {
        tracing::debug!(conn_id = conn.id(), stmt = %stmt_name, %sql, "preparing statement");
    } else {
        tracing::trace!(conn_id = conn.id(), stmt = %stmt_name, "reusing prepared statement");
    }

    let mut query = sqlx::query(sql);
    for param in params {
        query = query.bind(stringify_param(param));
    }

    let rows = query
        .fetch_all(conn.as_mut())
        .await
        .map_err(DataError::database)?;

    let rows_json: Vec<Value> = rows.iter().map(|row| Value::Object(row_to_json(row))).collect();
    Ok(json!({ "rows": rows_json }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stringifies_string_as_is() {
        assert_eq!(stringify_param(&json!("hello")), "hello");
    }

    #[test]
    fn stringifies_integer_without_decimal() {
        assert_eq!(stringify_param(&json!(42)), "42");
    }

    #[test]
    fn stringifies_other_types_by_compact_serialization() {
        assert_eq!(stringify_param(&json!([1, 2])), "[1,2]");
        assert_eq!(stringify_param(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn stringifies_null_as_empty() {
        assert_eq!(stringify_param(&Value::Null), "");
    }
}
