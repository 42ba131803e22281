//! In-process HTTP test client for a running `RuntimeContext`.
//!
//! Uses `tower::ServiceExt::oneshot` to dispatch requests through the
//! dispatcher without binding to a TCP port, the way `r2e_test::TestApp`
//! drives an `axum::Router` in-process for its own callers.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tower::util::ServiceExt;

use webforge_runtime::RuntimeContext;

pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Wrap an already-assembled `axum::Router`.
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Build the dispatcher's router directly from a `RuntimeContext`.
    pub fn from_runtime(rt: Arc<RuntimeContext>) -> Self {
        let router = Router::new().fallback(webforge_runtime::dispatch::dispatch).with_state(rt);
        Self::new(router)
    }

    /// Parse `source` as a site, with no database configured, and build a
    /// `TestApp` around it. `base_dir` anchors any `include` statements the
    /// source contains.
    pub fn from_site_source(source: &str, base_dir: &Path) -> Self {
        let (site, errors) = webforge_parser::parse_site(source, base_dir);
        assert!(errors.is_empty(), "test fixture failed to parse: {errors:?}");
        let rt = RuntimeContext::new(site, None);
        Self::from_runtime(rt)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.expect("failed to read response body").to_bytes();

        TestResponse { status, headers, body }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder().method(Method::GET).uri(path).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_json(&self, path: &str, body: &impl serde::Serialize) -> TestResponse {
        let json = serde_json::to_vec(body).unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        let req = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(self.status, expected, "expected {expected}, got {}: {}", self.status, self.text());
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| panic!("failed to parse JSON: {e}\nbody: {}", self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
