//! Application Error Types
//!
//! Centralized error handling with Axum integration. Failures serialize as
//! `{ok: false, error: "..."}`, the shape the extension's background script
//! expects.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::presence_service::PresenceError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Presence(#[from] PresenceError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Presence(err) => {
                tracing::error!(error = %err, "Presence call failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            ok: false,
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
