mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{worker, FakeProvider};
use renderflow::api::{router, ApiState};
use renderflow::relay::{IdentifierPolicy, QueryRelay};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

/// Router over a pool that never connects; every request here must be
/// answered before the store is reached.
fn app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://renderflow@127.0.0.1:1/unused")
        .expect("lazy pool");

    router(ApiState {
        relay: QueryRelay::new(pool.clone(), IdentifierPolicy::permissive()),
        worker: worker(&pool, FakeProvider::new(), 3),
    })
}

async fn send(method: Method, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let res = app()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("json body")
}

#[tokio::test]
async fn relay_rejects_non_post_methods() {
    for m in [Method::GET, Method::PUT, Method::DELETE] {
        let (status, body) = send(m, "/api/db", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json_body(&body), json!({ "error": "Only POST allowed" }));
    }
}

#[tokio::test]
async fn worker_rejects_other_methods() {
    let (status, body) = send(Method::DELETE, "/api/worker", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(&body), json!({ "error": "Use GET/POST" }));
}

#[tokio::test]
async fn empty_body_is_a_missing_table() {
    let (status, body) = send(Method::POST, "/api/db", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({ "error": "Missing table" }));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (status, body) = send(Method::POST, "/api/db", "{\"table\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON"));
}

#[tokio::test]
async fn validation_errors_name_the_problem() {
    let cases = [
        (json!({ "action": "select" }), "Missing table"),
        (json!({ "action": "merge", "table": "videos" }), "Unknown action"),
        (json!({ "action": "insert", "table": "videos" }), "Missing values"),
        (
            json!({ "action": "update", "table": "videos", "values": { "status": "READY" } }),
            "Missing values/where",
        ),
        (json!({ "action": "delete", "table": "videos" }), "Missing where"),
    ];

    for (req, expected) in cases {
        let (status, body) = send(Method::POST, "/api/db", &req.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "request {req}");
        assert_eq!(json_body(&body)["error"], json!(expected), "request {req}");
    }
}

#[tokio::test]
async fn unsafe_identifiers_never_reach_the_store() {
    let req = json!({
        "action": "select",
        "table": "videos\"; DROP TABLE videos; --"
    });
    let (status, body) = send(Method::POST, "/api/db", &req.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid identifier"));
}

#[tokio::test]
async fn health_answers_ok() {
    let (status, body) = send(Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
