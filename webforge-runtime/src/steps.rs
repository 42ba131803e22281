//! The four pipeline step executors (§4.8): transform, script, static SQL,
//! dynamic SQL. Modeled as a tagged variant dispatched in [`crate::pipeline`]
//! rather than as stored function pointers — see DESIGN.md for why a
//! function-pointer-per-step design (the source's own approach) doesn't
//! carry over cleanly to Rust's ownership model.

use std::sync::Arc;

use serde_json::{json, Value};
use webforge_core::ast::{StepKind, StepSource};
use webforge_script::context::ScriptContext;

use crate::context::RuntimeContext;

/// Shallow top-level merge: `base`'s keys survive except where `overlay`
/// also declares them, in which case `overlay` wins (§4.8's "script-set
/// keys win" contract, generalized to every step kind that merges input
/// into its own result).
pub fn merge_shallow(base: &Value, overlay: Value) -> Value {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    if let Value::Object(overlay_map) = overlay {
        for (key, value) in overlay_map {
            merged.insert(key, value);
        }
        Value::Object(merged)
    } else {
        overlay
    }
}

pub async fn run_step(
    kind: StepKind,
    source: &StepSource,
    input: &Value,
    rt: &Arc<RuntimeContext>,
    session_id: Option<&str>,
) -> Option<Value> {
    match kind {
        StepKind::Transform => run_transform(source, input, rt),
        StepKind::Script => run_script(source, input, rt, session_id).await,
        StepKind::StaticSql => run_static_sql(source, input, rt).await,
        StepKind::DynamicSql => run_dynamic_sql(input, rt).await,
    }
}

fn run_transform(source: &StepSource, input: &Value, rt: &Arc<RuntimeContext>) -> Option<Value> {
    let text = match source {
        StepSource::Inline(text) => text.clone(),
        StepSource::Named(name) => match rt.index.named_transform(name) {
            Some(t) => t.source.clone(),
            None => return Some(json!({"error": "Transform not found"})),
        },
        StepSource::None => return Some(json!({"error": "Transform step requires source text"})),
    };

    let program = match rt.transform_cache.get_or_compile(&text) {
        Ok(program) => program,
        Err(msg) => return Some(json!({"error": msg})),
    };
    match webforge_transform::eval(&program, input) {
        Ok(value) => Some(value),
        Err(msg) => Some(json!({"error": msg})),
    }
}

async fn run_script(source: &StepSource, input: &Value, rt: &Arc<RuntimeContext>, session_id: Option<&str>) -> Option<Value> {
    let text = match source {
        StepSource::Inline(text) => text.clone(),
        StepSource::Named(name) => match rt.index.named_script(name) {
            Some(s) => s.source.clone(),
            None => return Some(json!({"error": "Script not found"})),
        },
        StepSource::None => return Some(json!({"error": "Script step requires source text"})),
    };

    let ctx = ScriptContext {
        request: input.clone(),
        query: input.get("query").cloned().unwrap_or(Value::Null),
        body: input.get("body").cloned().unwrap_or(Value::Null),
        headers: input.get("headers").cloned().unwrap_or(Value::Null),
        cookies: input.get("cookies").cloned().unwrap_or(Value::Null),
        params: input.get("params").cloned().unwrap_or(Value::Null),
    };

    let host = rt.host_for_session(session_id.map(str::to_string));
    match rt.script_engine.run(&text, &ctx, host).await {
        Ok(result) => Some(merge_shallow(input, result)),
        Err(msg) => Some(json!({"error": msg})),
    }
}

/// Pull the parameter vector out of `input` per §4.8: prefer `input.params`
/// if it's an array, otherwise treat `input` itself as the parameter array.
fn extract_params(input: &Value) -> Vec<Value> {
    if let Some(Value::Array(params)) = input.get("params") {
        return params.clone();
    }
    if let Value::Array(items) = input {
        return items.clone();
    }
    Vec::new()
}

async fn run_static_sql(source: &StepSource, input: &Value, rt: &Arc<RuntimeContext>) -> Option<Value> {
    let sql = match source {
        StepSource::Inline(text) => text.clone(),
        StepSource::Named(name) => match rt.index.named_query(name) {
            Some(q) => q.sql.clone(),
            None => return None,
        },
        StepSource::None => return None,
    };
    execute_sql(&sql, &extract_params(input), input, rt).await
}

async fn run_dynamic_sql(input: &Value, rt: &Arc<RuntimeContext>) -> Option<Value> {
    let sql = input.get("sql").and_then(Value::as_str)?.to_string();
    let params = extract_params(input);
    execute_sql(&sql, &params, input, rt).await
}

/// Any failure here (pool exhaustion, connection loss, a bad query) is
/// logged and surfaces as a bare `None` (§4.8: "any SQL step whose
/// execution fails returns null") — the specific message never reaches the
/// pipeline's JSON channel, only `tracing`, matching §7's "anything
/// unrecoverable should be logged and null-returned".
async fn execute_sql(sql: &str, params: &[Value], input: &Value, rt: &Arc<RuntimeContext>) -> Option<Value> {
    let Some(pool) = rt.pool.as_ref() else {
        tracing::error!("sql step executed with no database configured");
        return None;
    };
    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(err) => {
            tracing::error!(%err, "failed to acquire a pooled connection");
            return None;
        }
    };
    match webforge_data::query::execute(&mut conn, &rt.statements, sql, params).await {
        Ok(result) => Some(merge_shallow(input, result)),
        Err(err) => {
            tracing::error!(%err, %sql, "sql step failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_overlay_keys() {
        let base = json!({"a": 1, "b": 2});
        let overlay = json!({"b": 3, "c": 4});
        assert_eq!(merge_shallow(&base, overlay), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn extract_params_prefers_params_field() {
        assert_eq!(extract_params(&json!({"params": [1, 2]})), vec![json!(1), json!(2)]);
    }

    #[test]
    fn extract_params_falls_back_to_array_input() {
        assert_eq!(extract_params(&json!([1, "x"])), vec![json!(1), json!("x")]);
    }

    #[test]
    fn extract_params_defaults_to_empty() {
        assert_eq!(extract_params(&json!({"other": true})), Vec::<Value>::new());
    }
}
