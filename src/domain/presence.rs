//! Outbound presence payloads.

use chrono::{DateTime, Utc};

use super::playback::PlaybackStatus;

/// Label on the single action button linking back to the episode page.
pub const OPEN_EPISODE_LABEL: &str = "Open episode";

/// An action button shown on the remote presence card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityButton {
    pub label: String,
    pub url: String,
}

/// A fully assembled presence update.
///
/// Derived purely from a normalized playback status and the session anchor;
/// never persisted. Optional parts are modeled as `Option` rather than
/// sentinel values so the transport can omit them on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PresencePayload {
    /// Primary line on the presence card (the show title)
    pub details: String,

    /// Secondary line (episode label plus elapsed/duration)
    pub state: String,

    /// Image reference: poster URL or the configured fallback key
    pub large_image: String,

    /// Hover text over the image
    pub large_text: String,

    /// Session start as Unix seconds; drives the remote elapsed-time display
    pub start_anchor: Option<i64>,

    /// Optional link back to the episode page
    pub button: Option<ActivityButton>,
}

impl PresencePayload {
    /// Build an update payload from a playback status.
    ///
    /// The elapsed-time anchor is the session start, not the raw playback
    /// position, so the remote display keeps counting continuously across
    /// successive updates.
    pub fn from_status(
        status: &PlaybackStatus,
        fallback_image: &str,
        session_start: DateTime<Utc>,
    ) -> Self {
        let large_image = status
            .poster_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(fallback_image)
            .to_string();

        let button = status
            .page_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| ActivityButton {
                label: OPEN_EPISODE_LABEL.to_string(),
                url: url.to_string(),
            });

        Self {
            details: status.title.clone(),
            state: status.state_line(),
            large_image,
            large_text: status.title.clone(),
            start_anchor: Some(session_start.timestamp()),
            button,
        }
    }
}
