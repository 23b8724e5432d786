//! Presence Handlers
//!
//! Translate HTTP requests into presence controller calls and controller
//! outcomes into the wire responses the extension understands.

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::application::presence_service::UpdateOutcome;
use crate::domain::playback::PlaybackEvent;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Success response body.
///
/// `{ok: true}` for a plain success, plus `skipped`/`reason` when rate
/// limiting downgraded the update, or `reconnected` when the channel was
/// re-established along the way.
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnected: Option<bool>,
}

impl PresenceResponse {
    fn ok() -> Self {
        Self {
            ok: true,
            skipped: None,
            reason: None,
            reconnected: None,
        }
    }

    fn skipped(retry_in: std::time::Duration) -> Self {
        Self {
            ok: true,
            skipped: Some(true),
            reason: Some(format!(
                "rate limited, next update allowed in {:.1}s",
                retry_in.as_secs_f64()
            )),
            reconnected: None,
        }
    }

    fn reconnected() -> Self {
        Self {
            ok: true,
            skipped: None,
            reason: None,
            reconnected: Some(true),
        }
    }
}

/// `POST /update` - forward a playback event to the chat client
pub async fn update_presence(
    State(state): State<AppState>,
    payload: Result<Json<PlaybackEvent>, JsonRejection>,
) -> Result<Json<PresenceResponse>, AppError> {
    let Json(event) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let response = match state.service.update(event).await? {
        UpdateOutcome::Forwarded { reconnected: false } => PresenceResponse::ok(),
        UpdateOutcome::Forwarded { reconnected: true } => PresenceResponse::reconnected(),
        UpdateOutcome::Skipped { retry_in } => PresenceResponse::skipped(retry_in),
    };
    Ok(Json(response))
}

/// `POST /clear` - remove the presence display; no body required
pub async fn clear_presence(
    State(state): State<AppState>,
) -> Result<Json<PresenceResponse>, AppError> {
    let outcome = state.service.clear().await?;
    let response = if outcome.reconnected {
        PresenceResponse::reconnected()
    } else {
        PresenceResponse::ok()
    };
    Ok(Json(response))
}
