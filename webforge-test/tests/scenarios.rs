//! End-to-end scenarios (§8): each drives a minimal in-memory site through
//! the real dispatcher via [`TestApp`], exercising route resolution,
//! pipeline execution, validation, and template rendering together rather
//! than any one component in isolation.

use std::sync::Arc;

use http::StatusCode;
use webforge_runtime::RuntimeContext;
use webforge_test::TestApp;

fn app_for(source: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    TestApp::from_site_source(source, dir.path())
}

#[tokio::test]
async fn scenario_b_route_parameters() {
    let app = app_for(
        r#"website {
            api {
                route "/api/notes/:id/comments/:comment_id"
                method "GET"
                pipeline {
                    transform { { params: .params, url: .url, method: .method } }
                }
            }
        }"#,
    );

    let response = app.get("/api/notes/123/comments/456").await.assert_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["params"]["id"], "123");
    assert_eq!(body["params"]["comment_id"], "456");
    assert_eq!(body["url"], "/api/notes/123/comments/456");
    assert_eq!(body["method"], "GET");
}

#[tokio::test]
async fn scenario_c_json_post_validation_failure() {
    let app = app_for(
        r#"website {
            api {
                route "/api/test/json"
                method "POST"
                fields {
                    name { type "string" required "true" length 2..50 }
                    age { type "number" required "true" }
                    email { type "string" required "true" format "email" }
                }
                pipeline {
                    transform { { ok: true } }
                }
            }
        }"#,
    );

    let body = serde_json::json!({"name": "", "age": "not a number", "email": "not-an-email"});
    let response = app.post_json("/api/test/json", &body).await.assert_status(StatusCode::BAD_REQUEST);
    let parsed: serde_json::Value = response.json();
    let errors = parsed["errors"].as_object().expect("errors object");
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("age"));
    assert!(errors.contains_key("email"));
}

#[tokio::test]
async fn scenario_d_page_with_reference_data_and_templates() {
    let app = app_for(
        r#"website {
            page "form-with-ref" {
                route "/test/form-with-ref"
                method "POST"
                fields {
                    message { type "string" required "true" length 5..50 }
                    category { type "string" required "true" }
                }
                referenceData {
                    transform {
                        { categories: [
                            { id: "1", name: "Category 1" },
                            { id: "2", name: "Category 2" },
                            { id: "3", name: "Category 3" }
                        ] }
                    }
                }
                pipeline {
                    transform { { message: .body.message, category: .body.category } }
                }
                error {
                    mustache {
                        {{#categories}}{{name}}{{/categories}} {{#values}}value="{{message}}"{{/values}}
                    }
                }
                success {
                    mustache {
                        Message: {{message}} Category: {{category}}
                    }
                }
            }
        }"#,
    );

    let too_short = app.post_form("/test/form-with-ref", "message=Hi&category=1").await.assert_ok();
    let error_body = too_short.text();
    assert!(error_body.contains("Category 1"));
    assert!(error_body.contains("Category 2"));
    assert!(error_body.contains("Category 3"));
    assert!(error_body.contains(r#"value="Hi""#));

    let ok = app.post_form("/test/form-with-ref", "message=Hello+World&category=2").await.assert_ok();
    let success_body = ok.text();
    assert!(success_body.contains("Message: Hello World"));
    assert!(success_body.contains("Category: 2"));
}

#[tokio::test]
async fn scenario_e_redirect_on_success() {
    let app = app_for(
        r#"website {
            page "redirecting" {
                route "/test/redirect"
                method "POST"
                fields {
                    message { type "string" required "true" length 1..50 }
                }
                pipeline {
                    transform { { message: .body.message } }
                }
                redirect "/dest"
            }
        }"#,
    );

    let response = app.post_form("/test/redirect", "message=hello").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), Some("/dest"));
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn scenario_f_not_found() {
    let app = app_for(r#"website { name "Empty" }"#);
    let response = app.get("/nowhere").await.assert_not_found();
    assert!(response.text().contains("404 Not Found"));
}

#[tokio::test]
async fn method_mismatch_is_405() {
    let app = app_for(
        r#"website {
            api {
                route "/api/only-get"
                method "GET"
                pipeline { transform { { ok: true } } }
            }
        }"#,
    );

    let response = app.post_json("/api/only-get", &serde_json::json!({})).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn api_responses_carry_a_permissive_cors_header() {
    let app = app_for(
        r#"website {
            api {
                route "/api/cors"
                method "GET"
                pipeline { transform { { ok: true } } }
            }
        }"#,
    );

    let response = app.get("/api/cors").await.assert_ok();
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
}

/// Exercises the static-SQL + script + transform pipeline from scenario A
/// against a live Postgres database. Skipped unless `DATABASE_URL` is set,
/// since the connection pool (§4.6) speaks Postgres only and this project
/// carries no in-process database fake.
#[tokio::test]
async fn scenario_a_pipeline_with_transform() {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping scenario_a_pipeline_with_transform: DATABASE_URL not set");
        return;
    };

    let (site, errors) = webforge_parser::parse_site(
        r#"website {
            api {
                route "/api/test/pipeline"
                method "GET"
                pipeline {
                    sql { SELECT 1 as num, 'test' as str }
                    script { request.transformed = true; return request }
                    transform { { result: { string: .rows[0].str, transformed: .transformed } } }
                }
            }
        }"#,
        std::path::Path::new("."),
    );
    assert!(errors.is_empty(), "{errors:?}");

    let pool = webforge_data::pool::ConnectionPool::connect(&database_url, 1, 5)
        .await
        .expect("failed to connect to DATABASE_URL");
    let rt = RuntimeContext::new(site, Some(pool));
    let app = TestApp::from_runtime(Arc::clone(&rt));

    let response = app.get("/api/test/pipeline").await.assert_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body, serde_json::json!({"result": {"string": "test", "transformed": true}}));
}
