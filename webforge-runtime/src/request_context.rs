//! Builds the request-context JSON object (§4.11 step 5): the single value
//! threaded through validation, the reference-data pipeline, the main
//! pipeline, and the template engine.

use serde_json::{json, Map, Value};
use webforge_core::route_pattern::{match_route, RouteParams};

#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    pub url: String,
    pub version: String,
    pub query: Value,
    pub headers: Value,
    pub cookies: Value,
    pub body: Value,
    pub user: Option<Value>,
}

/// Build `{method, url, version, user?, isLoggedIn, query, headers,
/// cookies, params, body}`. `user` is present only when a session is
/// attached to the request; its absence (rather than `null`) is what
/// distinguishes "not logged in" for templates that check `{{#user}}`.
pub fn build_request_context(request: &IncomingRequest, params: &RouteParams) -> Value {
    let mut params_map = Map::new();
    for (name, value) in params.iter() {
        params_map.insert(name.to_string(), Value::String(value.to_string()));
    }

    let mut context = json!({
        "method": request.method,
        "url": request.url,
        "version": request.version,
        "isLoggedIn": request.user.is_some(),
        "query": request.query,
        "headers": request.headers,
        "cookies": request.cookies,
        "params": Value::Object(params_map),
        "body": request.body,
    });

    if let Some(user) = &request.user {
        context.as_object_mut().unwrap().insert("user".to_string(), user.clone());
    }
    context
}

/// The pipeline's synthesized default input when a page/API declares no
/// pipeline at all (§4.11 step 7: "if absent, synthesizes an object
/// containing `request`").
pub fn synthesize_default_input(request_context: Value) -> Value {
    json!({ "request": request_context })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_context_with_route_params_and_no_user() {
        let request = IncomingRequest {
            method: "GET".into(),
            url: "/notes/123/comments/456".into(),
            version: "HTTP/1.1".into(),
            query: json!({}),
            headers: json!({}),
            cookies: json!({}),
            body: Value::Null,
            user: None,
        };
        let params = match_route("/notes/:id/comments/:comment_id", &request.url).unwrap();

        let ctx = build_request_context(&request, &params);
        assert_eq!(ctx["method"], json!("GET"));
        assert_eq!(ctx["isLoggedIn"], json!(false));
        assert_eq!(ctx["params"], json!({"id": "123", "comment_id": "456"}));
        assert!(ctx.get("user").is_none());
    }

    #[test]
    fn includes_user_and_marks_logged_in_when_present() {
        let request = IncomingRequest {
            user: Some(json!({"id": "u1"})),
            ..Default::default()
        };
        let ctx = build_request_context(&request, &RouteParams::default());
        assert_eq!(ctx["isLoggedIn"], json!(true));
        assert_eq!(ctx["user"], json!({"id": "u1"}));
    }

    #[test]
    fn default_pipeline_input_wraps_request_under_a_request_key() {
        let ctx = json!({"method": "GET"});
        assert_eq!(synthesize_default_input(ctx.clone()), json!({"request": ctx}));
    }
}
