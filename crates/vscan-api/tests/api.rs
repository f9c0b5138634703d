//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use vscan_api::{create_router, AppConfig, AppState};
use vscan_models::Event;

async fn setup(root: &Path) -> (Router, AppState) {
    let mut config = AppConfig::for_root(root, "http://127.0.0.1:9");
    config.ffprobe_path = "vscan-test-missing-ffprobe".to_string();
    config.worker.max_retries = 0;

    let state = AppState::new(&config).await.unwrap();
    state.library.refresh().await.unwrap();
    (create_router(state.clone(), None), state)
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"video").unwrap();
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_sets_headers() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup(dir.path()).await;

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_supplied_request_id_is_echoed() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup(dir.path()).await;

    let request = Request::builder()
        .uri("/api/processing/status")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_ready_reports_unreachable_worker() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup(dir.path()).await;

    let (status, body) = send(&app, empty_request("GET", "/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["library"]["status"], "ok");
    assert_eq!(body["checks"]["worker"]["status"], "error");
}

#[tokio::test]
async fn test_enqueue_validates_body() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup(dir.path()).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/processing/queue", json!({"paths": "a.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("paths"));

    let (status, _) = send(
        &app,
        json_request("POST", "/api/processing/queue", json!({"paths": ["../x.mp4"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_enqueue_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup(dir.path()).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/processing/queue", json!({"paths": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"queued": 0, "skipped": 0, "total": 0}));

    let (_, body) = send(&app, empty_request("GET", "/api/processing/status")).await;
    assert_eq!(
        body,
        json!({"currentJob": null, "queue": [], "isProcessing": false})
    );

    let (status, body) = send(&app, empty_request("DELETE", "/api/processing/queue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn test_search_refresh_delete_and_move() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "NVR-blank/b.mp4");
    touch(dir.path(), "cam/a.mp4");
    let (app, state) = setup(dir.path()).await;

    let (status, body) = send(&app, empty_request("POST", "/api/library/search")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 50);
    assert_eq!(body["items"][0]["path"], "cam/a.mp4");
    assert_eq!(body["items"][0]["processed"], false);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/library/search", json!({"dirs": ["NVR-blank"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/library/move", json!({"path": "NVR-blank/b.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "newPath": "NVR-upload/b.mp4"}));
    assert!(dir.path().join("NVR-upload/b.mp4").exists());

    let (status, _) = send(
        &app,
        json_request("POST", "/api/library/move", json!({"path": "cam/a.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, empty_request("DELETE", "/api/files/cam/a.mp4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(!dir.path().join("cam/a.mp4").exists());
    assert!(state.library.get("cam/a.mp4").is_none());

    let (status, _) = send(&app, empty_request("DELETE", "/api/files/cam/a.mp4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    touch(dir.path(), "cam/c.mp4");
    let (status, body) = send(&app, empty_request("POST", "/api/library/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2}));
}

#[tokio::test]
async fn test_durations_without_probe() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a.mp4");
    let (app, _state) = setup(dir.path()).await;

    let (status, body) = send(&app, empty_request("GET", "/api/library/duration?path=a.mp4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"duration": null}));

    let (status, _) = send(&app, empty_request("GET", "/api/library/duration?path=../a.mp4")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/library/durations", json!({"paths": ["a.mp4", "b.mp4"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"a.mp4": null, "b.mp4": null}));
}

#[tokio::test]
async fn test_event_stream_frames() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = setup(dir.path()).await;

    let response = app.oneshot(empty_request("GET", "/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    state.events.publish(Event::job_started("a.mp4", 3));

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("no frame received")
        .expect("stream ended")
        .unwrap();

    assert_eq!(
        String::from_utf8(chunk.to_vec()).unwrap(),
        "event: processing_started\ndata: {\"path\":\"a.mp4\",\"queueLength\":3}\n\n"
    );
}
