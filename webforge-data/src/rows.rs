//! Row → JSON conversion (§6: "Result rows are converted to JSON with
//! column names as keys and values as strings (null becomes JSON null)").

use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Convert one row into a JSON object. Every non-null column is stringified
/// regardless of its Postgres type; `NULL` becomes `Value::Null`.
pub fn row_to_json(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::with_capacity(row.columns().len());
    for (i, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), decode_column(row, i));
    }
    map
}

fn decode_column(row: &PgRow, index: usize) -> Value {
    let Ok(raw) = row.try_get_raw(index) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }

    macro_rules! try_as_string {
        ($ty:ty) => {
            if let Ok(v) = row.try_get::<$ty, _>(index) {
                return Value::String(v.to_string());
            }
        };
    }

    match raw.type_info().name() {
        "INT2" | "INT4" => try_as_string!(i32),
        "INT8" => try_as_string!(i64),
        "FLOAT4" => try_as_string!(f32),
        "FLOAT8" | "NUMERIC" => try_as_string!(f64),
        "BOOL" => try_as_string!(bool),
        "TIMESTAMP" => try_as_string!(chrono::NaiveDateTime),
        "TIMESTAMPTZ" => try_as_string!(chrono::DateTime<chrono::Utc>),
        "DATE" => try_as_string!(chrono::NaiveDate),
        _ => {}
    }

    // Default: every text-like column (TEXT, VARCHAR, UUID, JSON, ...)
    // decodes directly as a string.
    row.try_get::<String, _>(index)
        .map(Value::String)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    // `PgRow` cannot be constructed outside a live connection, so row
    // conversion itself is exercised by the end-to-end scenarios in
    // `webforge-test` against a real pool. Nothing worth unit-testing here
    // in isolation.
}
