//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Basic health check with the presence channel state

use axum::{extract::State, Json};
use serde::Serialize;

use crate::startup::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether the presence channel is currently connected. The bridge is
    /// healthy even when it is not; the next event retries the connect.
    pub discord_connected: bool,
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        discord_connected: state.connection.is_connected().await,
    })
}
