mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    routing::get,
    Json, Router,
};
use ielts_practice::router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    // Nothing in these tests should reach upstream.
    let upstream = common::spawn_upstream(Router::new()).await;
    router(common::app_state(&upstream, &common::temp_cache_dir()).await)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn lists_every_exercise_type() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/exercises", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 12);
    let reading1 = list.iter().find(|e| e["type"] == "reading1").unwrap();
    assert_eq!(reading1["grading"], "local");
    assert_eq!(reading1["storage_key"], "ieltsReading1Task");
}

#[tokio::test]
async fn topics_come_from_config() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/topics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["topics"].as_array().unwrap().iter().any(|t| t["id"] == "daily-life"));
}

#[tokio::test]
async fn unknown_exercise_type_is_rejected() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/exercises/listening", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("listening"));
}

#[tokio::test]
async fn fresh_session_is_idle_and_topic_moves_it_on() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/exercises/reading2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["submitted"], false);
    assert_eq!(body["score"], Value::Null);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/exercises/reading2/topic",
        Some(json!({ "topic": "environment" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "topic_selected");
    assert_eq!(body["selected_topic"], "environment");
}

#[tokio::test]
async fn state_violations_map_to_client_errors() {
    let app = app().await;

    let (status, _) = send(&app, Method::POST, "/api/v1/exercises/reading1/topic", Some(json!({ "topic": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/api/v1/exercises/reading1/generate", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/api/v1/exercises/reading1/answers", Some(json!({ "answers": { "1": "x" } }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::POST, "/api/v1/exercises/reading1/retry", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::POST, "/api/v1/exercises/reading1/drill/next", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn task_detail_requires_a_bearer_token() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/tasks/abc", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "missing bearer token");
}

#[tokio::test]
async fn task_detail_is_proxied_with_the_token() {
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/v1/tasks/:id",
        get(|headers: axum::http::HeaderMap| async move {
            let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
            Json(json!({ "id": "t-1", "auth": auth }))
        }),
    ))
    .await;
    let app = router(common::app_state(&upstream, &common::temp_cache_dir()).await);

    let req = Request::builder()
        .uri("/api/v1/tasks/t-1")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["auth"], "Bearer secret");
}

#[tokio::test]
async fn upstream_failure_is_a_bad_gateway() {
    let app = app().await;
    let (status, _) = send(&app, Method::POST, "/api/v1/exercises/summary/topic", Some(json!({ "topic": "science" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, "/api/v1/exercises/summary/generate", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["message"].as_str().unwrap().contains("404"));

    let (_, view) = send(&app, Method::GET, "/api/v1/exercises/summary", None).await;
    assert_eq!(view["phase"], "topic_selected");
    assert_eq!(view["retry"], "generate");
}
