use super::*;
use crate::config::DownloadConfig;
use crate::db::Database;
use crate::materializer::Materializer;
use crate::remote::{RemoteState, RemoteStatus, StatusClient};
use crate::types::{ApiType, TaskId};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;


/// Status client that always reports the same remote state
struct FixedStatus(Option<RemoteStatus>);

#[async_trait]
impl StatusClient for FixedStatus {
    async fn query(&self, _task_id: &TaskId, _api_type: Option<ApiType>) -> Result<RemoteStatus> {
        self.0
            .clone()
            .ok_or_else(|| crate::Error::Remote("HTTP 503 Service Unavailable".to_string()))
    }
}

fn processing() -> Option<RemoteStatus> {
    Some(RemoteStatus {
        status_code: 200,
        state: RemoteState::Processing,
        result_urls: Vec::new(),
        error_message: None,
        raw: serde_json::Value::Null,
    })
}

/// Tracker over a temporary store; downloads disabled
async fn create_test_tracker(remote: Option<RemoteStatus>) -> (TaskTracker, TempDir) {
    let temp_dir = tempdir().unwrap();
    let db = Database::new(&temp_dir.path().join("tasks.db")).await.unwrap();
    let materializer = Materializer::new(DownloadConfig::default(), reqwest::Client::new());
    let tracker = TaskTracker::with_parts(db, Arc::new(FixedStatus(remote)), materializer);
    (tracker, temp_dir)
}

async fn test_app(config: Config, remote: Option<RemoteStatus>) -> (Router, TaskTracker, TempDir) {
    let (tracker, temp_dir) = create_test_tracker(remote).await;
    let app = create_router(tracker.clone(), Arc::new(config));
    (app, tracker, temp_dir)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (tracker, _temp_dir) = create_test_tracker(None).await;

    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn(async move { start_api_server(tracker, config).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server exited early");

    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = Config::default();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let (app, _tracker, _temp_dir) = test_app(config, None).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let (app, _tracker, _temp_dir) = test_app(config, None).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let mut config = Config::default();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let (app, _tracker, _temp_dir) = test_app(config, None).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_api_key_guards_task_routes() {
    let mut config = Config::default();
    config.api.api_key = Some("s3cret".to_string());
    let (app, _tracker, _temp_dir) = test_app(config, None).await;

    let denied = app
        .clone()
        .oneshot(Request::builder().uri("/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let allowed = app
        .oneshot(
            Request::builder()
                .uri("/tasks")
                .header("X-Api-Key", "s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _tracker, _temp_dir) = test_app(Config::default(), None).await;

    let response = app
        .oneshot(Request::builder().uri("/downloads").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
