//! The request dispatcher (§4.11): the single fallback handler every
//! incoming request passes through.
//!
//! Laid out as the nine numbered steps in §4.11, in order: scratch arena,
//! body accumulation, built-in routes, route resolution, context assembly,
//! reference-data + validation (pages only), main pipeline, response
//! formation, arena release (implicit — the arena is dropped at the end of
//! the function).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};
use uuid::Uuid;
use webforge_core::arena::ScratchArena;
use webforge_core::ast::{HttpMethod, Page};

use crate::context::RuntimeContext;
use crate::error::DispatchError;
use crate::request_context::{build_request_context, synthesize_default_input, IncomingRequest};
use crate::templates;
use crate::validation::validate_all;

const SESSION_COOKIE: &str = "webforge_session";

/// The Axum fallback: every request not intercepted by a more specific
/// route goes through here (§4.11 item 3: "before generic routing" only
/// applies to the built-ins this function itself owns, since the dispatcher
/// *is* the router for everything else).
pub async fn dispatch(State(rt): State<Arc<RuntimeContext>>, request: Request<Body>) -> Response {
    let _arena = ScratchArena::for_request();

    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = request.headers().clone();

    if method == Method::GET && uri.path() == "/styles.css" {
        return styles_response(&rt);
    }

    let body_bytes = match axum::body::to_bytes(request.into_body(), 10 << 20).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::BAD_REQUEST, "failed to read request body").into_response(),
    };

    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let body = parse_body(content_type, &body_bytes);

    let http_method = match HttpMethod::parse(method.as_str()) {
        Some(m) => m,
        None => return (StatusCode::METHOD_NOT_ALLOWED, "unsupported HTTP method").into_response(),
    };

    let (session_id, session_cookie_header) = resolve_session(&headers);
    let query = parse_query(uri.query().unwrap_or(""));
    let headers_json = headers_to_json(&headers);
    let cookies_json = cookies_to_json(&headers);
    let path = uri.path().to_string();

    let incoming = IncomingRequest {
        method: method.as_str().to_string(),
        url: path.clone(),
        version: "HTTP/1.1".to_string(),
        query,
        headers: headers_json,
        cookies: cookies_json,
        body,
        user: None,
    };

    let response = if let Some((api, params)) = rt.index.match_api(&path, http_method) {
        let context = build_request_context(&incoming, &params);
        let result = run_with_validation(&api.fields, &context, &api.pipeline, &rt, Some(session_id.as_str())).await;
        api_response(result)
    } else if let Some((page, params)) = rt.index.match_page(&path, http_method) {
        let context = build_request_context(&incoming, &params);
        page_response(page, context, &incoming, &rt, &session_id).await
    } else if rt.index.api_route_exists(&path) || rt.index.page_route_exists(&path) {
        DispatchError::MethodNotAllowed.into_response()
    } else {
        DispatchError::NotFound.into_response()
    };

    attach_session_cookie(response, session_cookie_header)
}

enum PipelineOutcome {
    Ok(Value),
    Failed,
    Invalid(Value),
}

async fn run_with_validation(
    fields: &[webforge_core::ast::ApiField],
    context: &Value,
    pipeline: &[webforge_core::ast::PipelineStep],
    rt: &Arc<RuntimeContext>,
    session_id: Option<&str>,
) -> PipelineOutcome {
    if !fields.is_empty() {
        let body = context.get("body").cloned().unwrap_or(Value::Null);
        if let Some(failure) = validate_all(fields, &body) {
            return PipelineOutcome::Invalid(failure);
        }
    }

    let input = if pipeline.is_empty() {
        synthesize_default_input(context.clone())
    } else {
        context.clone()
    };

    match crate::pipeline::run_pipeline(pipeline, input, rt, session_id).await {
        Some(result) => PipelineOutcome::Ok(result),
        None => PipelineOutcome::Failed,
    }
}

fn api_response(outcome: PipelineOutcome) -> Response {
    let mut response = match outcome {
        PipelineOutcome::Ok(value) => axum::Json(value).into_response(),
        PipelineOutcome::Failed => DispatchError::PipelineError(json!({"error": "database error"})).into_response(),
        PipelineOutcome::Invalid(errors) => DispatchError::ValidationFailed(errors).into_response(),
    };
    response.headers_mut().insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn page_response(page: &Page, context: Value, incoming: &IncomingRequest, rt: &Arc<RuntimeContext>, session_id: &str) -> Response {
    let has_form_body = matches!(&incoming.body, Value::Object(_)) && incoming.method != "GET";

    if !page.fields.is_empty() && has_form_body {
        let reference_data = run_reference_data(page, &context, rt, session_id).await;
        let body = context.get("body").cloned().unwrap_or(Value::Null);
        if let Some(failure) = validate_all(&page.fields, &body) {
            let mut data_root = merge_with_request(&context, reference_data);
            if let Value::Object(map) = &mut data_root {
                if let Value::Object(failure_map) = failure {
                    for (key, value) in failure_map {
                        map.insert(key, value);
                    }
                }
            }
            return render_page(page, &data_root, "error", rt);
        }
    }

    let input = if page.pipeline.is_empty() {
        synthesize_default_input(context.clone())
    } else {
        context.clone()
    };

    let pipeline_result = crate::pipeline::run_pipeline(&page.pipeline, input, rt, Some(session_id)).await;

    let (data_root, outcome) = match pipeline_result {
        None => (merge_with_request(&context, json!({"error": "database error"})), "error"),
        Some(value) => {
            let is_error = matches!(&value, Value::Object(map) if map.contains_key("error") || map.contains_key("errors"));
            let data_root = merge_with_request(&context, value);
            (data_root, if is_error { "error" } else { "success" })
        }
    };

    if outcome != "error" {
        if let Some(target) = &page.redirect {
            return redirect_response(target);
        }
    }

    render_page(page, &data_root, outcome, rt)
}

async fn run_reference_data(page: &Page, context: &Value, rt: &Arc<RuntimeContext>, session_id: &str) -> Value {
    if page.reference_data.is_empty() {
        return Value::Object(Map::new());
    }
    crate::pipeline::run_pipeline(&page.reference_data, context.clone(), rt, Some(session_id))
        .await
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Guarantee the rendered data root always exposes a `request` field (§4.11
/// item 8: "merge `request` into the pipeline result"), while letting
/// anything the pipeline itself produced under that key take precedence.
fn merge_with_request(context: &Value, pipeline_result: Value) -> Value {
    crate::steps::merge_shallow(&json!({"request": context}), pipeline_result)
}

/// Render the page's error/success/primary template, then wrap it in the
/// named layout if one resolves (§3: "a Page references a Layout by name;
/// resolution may fail at request time", rendered without a shell then).
fn render_page(page: &Page, data_root: &Value, outcome: &str, rt: &RuntimeContext) -> Response {
    let template = match outcome {
        "error" => page.error_block.as_ref().or(page.template.as_ref()),
        _ => page.success_block.as_ref().or(page.template.as_ref()),
    };

    let Some(template) = template else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no template available to render").into_response();
    };

    let content = match templates::render(template, data_root) {
        Ok(content) => content,
        Err(msg) => return (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
    };

    let layout = page.layout.as_deref().and_then(|id| rt.index.layout(id));
    let content = match layout {
        Some(layout) => match templates::wrap_in_layout(content, layout.head.as_ref(), layout.body.as_ref(), data_root) {
            Ok(wrapped) => wrapped,
            Err(msg) => return (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        },
        None => content,
    };

    let status = if outcome == "error" && page.error_block.is_none() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    (status, axum::response::Html(content)).into_response()
}

fn redirect_response(target: &str) -> Response {
    let mut response = Response::builder().status(StatusCode::FOUND).body(Body::empty()).unwrap();
    if let Ok(value) = HeaderValue::from_str(target) {
        response.headers_mut().insert(axum::http::header::LOCATION, value);
    }
    response
}

fn styles_response(rt: &RuntimeContext) -> Response {
    let css = templates::aggregate_styles(&rt.site);
    (
        [(axum::http::header::CONTENT_TYPE, "text/css")],
        css,
    )
        .into_response()
}

fn parse_body(content_type: &str, bytes: &[u8]) -> Value {
    if content_type.starts_with("application/json") {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let mut map = Map::new();
        for (key, value) in form_urlencoded::parse(bytes) {
            map.insert(key.into_owned(), Value::String(value.into_owned()));
        }
        Value::Object(map)
    } else {
        Value::Null
    }
}

fn parse_query(raw: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        map.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    Value::Object(map)
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        if let Ok(text) = value.to_str() {
            map.insert(name.as_str().to_string(), Value::String(text.to_string()));
        }
    }
    Value::Object(map)
}

fn cookies_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for header in headers.get_all(axum::http::header::COOKIE) {
        let Ok(text) = header.to_str() else { continue };
        for pair in text.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                map.insert(name.to_string(), Value::String(value.to_string()));
            }
        }
    }
    Value::Object(map)
}

/// A minimal session identity stub (§4.11 ambient note): reads the session
/// cookie if present, mints a fresh UUID and a `Set-Cookie` header to
/// return otherwise. No login state is tracked here — that's out of scope
/// (§1) — this only gives `getStore`/`setStore` something to key on.
fn resolve_session(headers: &HeaderMap) -> (String, Option<HeaderValue>) {
    for header in headers.get_all(axum::http::header::COOKIE) {
        let Ok(text) = header.to_str() else { continue };
        for pair in text.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE {
                    return (value.to_string(), None);
                }
            }
        }
    }
    let id = Uuid::new_v4().to_string();
    let cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly")).ok();
    (id, cookie)
}

fn attach_session_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(axum::http::header::SET_COOKIE, cookie);
    }
    response
}
