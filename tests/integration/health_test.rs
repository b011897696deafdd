//! Integration tests for the HTTP health side-channel.

mod helpers;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use proctor_api::AppState;
use proctor_core::config::AppConfig;

async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = proctor_api::build_app(state)
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = get(AppState::new(AppConfig::default()), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_detailed_health_tracks_live_connections() {
    let app = helpers::TestApp::spawn().await;
    let (_admin, _) = app.admin().await;
    let _alice = app.student("s1", "Alice").await;

    let (status, body) = get(app.state.clone(), "/api/health/detailed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ws_connections"], 2);
    assert_eq!(body["data"]["admins"], 1);
    assert_eq!(body["data"]["students"], 1);
    assert_eq!(body["data"]["relay"]["connections_total"], 2);
}

#[tokio::test]
async fn test_ws_upgrade_refused_after_shutdown() {
    let state = AppState::new(AppConfig::default());
    state.relay.shutdown().await;

    let (status, body) = get(state.clone(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "shutting_down");

    let (status, _) = get(state, "/ws").await;
    assert!(status.is_client_error() || status == StatusCode::SERVICE_UNAVAILABLE);
}
