//! Presence API Tests
//!
//! Exercise the update and clear endpoints end to end against the fake
//! Discord IPC server.

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{body_json, TestApp, TEST_IMAGE_KEY};

#[tokio::test]
async fn first_update_is_forwarded_with_state_and_anchor() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/update",
            &json!({
                "title": "Show",
                "episode": "Ep 1",
                "current": 30,
                "duration": 1400,
            })
            .to_string(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));

    let activities = app.fake.activities();
    assert_eq!(activities.len(), 1);
    let activity = &activities[0]["activity"];
    assert_eq!(activity["details"], "Show");
    assert_eq!(activity["state"], "Ep 1 — 00:30 / 23:20");
    assert_eq!(activity["assets"]["large_image"], TEST_IMAGE_KEY);
    assert_eq!(activity["assets"]["large_text"], "Show");
    assert!(activity["timestamps"]["start"].is_i64());
    assert!(activity.get("buttons").is_none());
}

#[tokio::test]
async fn poster_url_and_page_url_shape_the_activity() {
    let app = TestApp::new().await;

    app.post_json(
        "/update",
        &json!({
            "title": "Show",
            "posterUrl": "https://img.example/poster.jpg",
            "pageUrl": "https://watch.example/ep1",
        })
        .to_string(),
    )
    .await;

    let activities = app.fake.activities();
    let activity = &activities[0]["activity"];
    assert_eq!(activity["assets"]["large_image"], "https://img.example/poster.jpg");
    assert_eq!(activity["buttons"][0]["label"], "Open episode");
    assert_eq!(activity["buttons"][0]["url"], "https://watch.example/ep1");
}

#[tokio::test]
async fn burst_updates_inside_the_window_are_skipped() {
    let app = TestApp::with_min_interval(300).await;

    let first = app.post_json("/update", &json!({"title": "Show"}).to_string()).await;
    assert_eq!(body_json(first).await, json!({"ok": true}));

    let second = app.post_json("/update", &json!({"title": "Show"}).to_string()).await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = body_json(second).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["skipped"], true);
    assert!(body["reason"].as_str().unwrap().contains("rate limited"));

    // Only the first update may reach the client.
    assert_eq!(app.fake.activities().len(), 1);
}

#[tokio::test]
async fn closed_channel_triggers_one_reconnect_and_retry() {
    let app = TestApp::new().await;

    app.post_json("/update", &json!({"title": "Show"}).to_string()).await;
    app.fake.drop_next_update();

    let response = app
        .post_json("/update", &json!({"title": "Show", "current": 60}).to_string())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true, "reconnected": true}));

    // First update plus the successful retry; the dropped attempt is gone.
    assert_eq!(app.fake.activities().len(), 2);
}

#[tokio::test]
async fn clear_sends_a_null_activity_and_reopens_the_session() {
    let app = TestApp::new().await;

    app.post_json("/update", &json!({"title": "Show"}).to_string()).await;

    let response = app.post_empty("/clear").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));

    app.post_json("/update", &json!({"title": "Show"}).to_string()).await;

    let activities = app.fake.activities();
    assert_eq!(activities.len(), 3);
    assert!(activities[1]["activity"].is_null());
    // The post-clear update opens a fresh session with its own anchor.
    assert!(activities[2]["activity"]["timestamps"]["start"].is_i64());
}

#[tokio::test]
async fn malformed_bodies_are_rejected_with_the_error_shape() {
    let app = TestApp::new().await;

    let response = app.post_json("/update", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());

    assert!(app.fake.activities().is_empty());
}

#[tokio::test]
async fn unreachable_client_surfaces_a_server_error() {
    let app = TestApp::new().await;
    // Point the bridge at a socket nobody listens on.
    drop(std::fs::remove_file(&app.fake.socket_path));

    let response = app.post_json("/update", &json!({"title": "Show"}).to_string()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
}
