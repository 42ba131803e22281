//! The pipeline executor (§4.7): threads a JSON value through an ordered
//! list of steps, short-circuiting the moment any step's output carries a
//! top-level `error` key.
//!
//! ```text
//! input := requestContext
//! for step in steps:
//!     if input contains a top-level "error" key:
//!         return copy(input)   // short-circuit
//!     output := step.execute(step, input, requestContext, arena)
//!     if output is null: return null
//!     input := output
//! return input
//! ```
//!
//! The "return a deep copy on short-circuit" clause is an open question in
//! the source material (see DESIGN.md): this implementation preserves it
//! literally, even though `serde_json::Value::clone` already deep-copies,
//! so there's no aliasing hazard either way — the clone exists so a caller
//! who mutates the returned value can never observe it back through a
//! step's retained input reference.

use serde_json::Value;
use std::sync::Arc;
use webforge_core::ast::PipelineStep;

use crate::context::RuntimeContext;
use crate::steps::run_step;

fn has_error_key(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key("error"))
}

/// Run `steps` starting from `initial`. Returns `None` if any step fails
/// outright (SQL execution error per §4.8); otherwise returns the final
/// threaded value, which may itself carry an `error`/`errors` key.
pub async fn run_pipeline(
    steps: &[PipelineStep],
    initial: Value,
    rt: &Arc<RuntimeContext>,
    session_id: Option<&str>,
) -> Option<Value> {
    let mut input = initial;
    for step in steps {
        if has_error_key(&input) {
            return Some(input.clone());
        }
        let output = run_step(step.kind, &step.source, &input, rt, session_id).await;
        match output {
            None => return None,
            Some(value) => input = value,
        }
    }
    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use webforge_core::ast::{Site, StepKind};
    use serde_json::json;

    fn rt() -> Arc<RuntimeContext> {
        RuntimeContext::new(Site::default(), None)
    }

    #[tokio::test]
    async fn empty_pipeline_returns_input_unchanged() {
        let result = run_pipeline(&[], json!({"request": {"method": "GET"}}), &rt(), None).await;
        assert_eq!(result, Some(json!({"request": {"method": "GET"}})));
    }

    #[tokio::test]
    async fn short_circuits_on_error_and_skips_later_steps() {
        let steps = vec![
            PipelineStep::inline(StepKind::Transform, "{ error: \"boom\" }"),
            PipelineStep::inline(StepKind::Transform, "{ unreachable: true }"),
        ];
        let result = run_pipeline(&steps, json!({}), &rt(), None).await.unwrap();
        assert_eq!(result, json!({"error": "boom"}));
    }

    #[tokio::test]
    async fn chains_transform_output_into_the_next_step() {
        let steps = vec![
            PipelineStep::inline(StepKind::Transform, "{ a: 1 }"),
            PipelineStep::inline(StepKind::Transform, "{ b: .a }"),
        ];
        let result = run_pipeline(&steps, json!({}), &rt(), None).await.unwrap();
        assert_eq!(result, json!({"b": 1}));
    }

    #[tokio::test]
    async fn unresolved_named_transform_produces_an_error_payload() {
        let steps = vec![PipelineStep::named(StepKind::Transform, "missing")];
        let result = run_pipeline(&steps, json!({}), &rt(), None).await.unwrap();
        assert_eq!(result, json!({"error": "Transform not found"}));
    }
}
