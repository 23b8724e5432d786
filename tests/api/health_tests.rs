//! Health and Metrics API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{body_json, TestApp};

#[tokio::test]
async fn health_reports_status_and_channel_state() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    // Nothing has connected yet; the bridge is healthy regardless.
    assert_eq!(body["discord_connected"], false);
}

#[tokio::test]
async fn health_shows_connected_after_an_update() {
    let app = TestApp::new().await;
    app.post_json("/update", &json!({"title": "Show"}).to_string()).await;

    let body = body_json(app.get("/health").await).await;
    assert_eq!(body["discord_connected"], true);
}

#[tokio::test]
async fn metrics_exposes_the_bridge_counters() {
    let app = TestApp::new().await;
    app.post_json("/update", &json!({"title": "Show"}).to_string()).await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("presence_bridge_updates_forwarded_total"));
}
