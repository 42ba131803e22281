//! The dispatcher's top-level error type (§7).
//!
//! Deliberately a small, closed enum rather than a generic `AppError` with
//! a dozen HTTP-status variants (contrast `r2e_core::AppError`): this
//! project has exactly the status/body shapes §7 enumerates — route not
//! found, method mismatch, validation failure, pipeline/SQL error — and
//! nothing else, so a smaller enum is the honest generalization here.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub enum DispatchError {
    /// §7 "Route not found" — 404 with minimal HTML body.
    NotFound,
    /// §7 "Method mismatch" — 405 with JSON body `{ "error": "Method not allowed" }`.
    MethodNotAllowed,
    /// §7 "Validation failure" (API route) — 400 with JSON body `{"errors": {...}}`.
    ValidationFailed(Value),
    /// §7 "SQL execution error" / "Pipeline step error" surfaced with no
    /// page to render an error-block into (API routes, or a page whose
    /// pipeline produced an error but declares no error-block).
    PipelineError(Value),
}

impl DispatchError {
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound => 404,
            DispatchError::MethodNotAllowed => 405,
            DispatchError::ValidationFailed(_) => 400,
            DispatchError::PipelineError(_) => 500,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::NotFound => {
                (StatusCode::NOT_FOUND, Html("<html><body>404 Not Found</body></html>")).into_response()
            }
            DispatchError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, axum::Json(json!({"error": "Method not allowed"}))).into_response()
            }
            DispatchError::ValidationFailed(errors) => (StatusCode::BAD_REQUEST, axum::Json(errors)).into_response(),
            DispatchError::PipelineError(errors) => {
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(errors)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_dispatch_table() {
        assert_eq!(DispatchError::NotFound.status(), 404);
        assert_eq!(DispatchError::MethodNotAllowed.status(), 405);
        assert_eq!(DispatchError::ValidationFailed(Value::Null).status(), 400);
        assert_eq!(DispatchError::PipelineError(Value::Null).status(), 500);
    }
}
