//! Inbound playback events and their normalization rules.
//!
//! The browser extension is not a trusted producer: fields may be missing,
//! wrongly typed, or oversized. Everything is clamped here so the rest of
//! the crate only ever sees well-formed values.

use serde::Deserialize;
use serde_json::Value;

/// Maximum length of the presence title in characters.
pub const TITLE_MAX_CHARS: usize = 128;

/// Maximum length of the episode label in characters.
pub const EPISODE_MAX_CHARS: usize = 64;

const DEFAULT_TITLE: &str = "Anime";
const DEFAULT_EPISODE: &str = "Episode";

/// Raw playback event as POSTed by the extension.
///
/// Numeric fields are kept as loose JSON values; extensions have been seen
/// sending positions as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackEvent {
    pub title: Option<String>,
    pub episode: Option<String>,
    pub current: Option<Value>,
    pub duration: Option<Value>,
    pub page_url: Option<String>,
    pub paused: Option<bool>,
    pub poster_url: Option<String>,
}

/// Playback status after defaulting and clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub title: String,
    pub episode: String,
    pub current_secs: f64,
    pub duration_secs: f64,
    pub page_url: Option<String>,
    pub paused: bool,
    pub poster_url: Option<String>,
}

impl PlaybackStatus {
    /// Normalize a raw event into a well-formed status.
    pub fn from_event(event: PlaybackEvent) -> Self {
        let title = match event.title {
            Some(title) => truncate_chars(&title, TITLE_MAX_CHARS),
            None => DEFAULT_TITLE.to_string(),
        };
        let episode = match event.episode {
            Some(episode) => truncate_chars(&episode, EPISODE_MAX_CHARS),
            None => DEFAULT_EPISODE.to_string(),
        };

        Self {
            title,
            episode,
            current_secs: seconds_or_zero(event.current.as_ref()),
            duration_secs: seconds_or_zero(event.duration.as_ref()),
            page_url: event.page_url,
            paused: event.paused.unwrap_or(false),
            poster_url: event.poster_url,
        }
    }

    /// Render the presence state line, e.g. `"Ep 1 — 00:30 / 23:20"`.
    ///
    /// The duration part is only appended when a positive duration is known.
    pub fn state_line(&self) -> String {
        let mut line = format!("{} — {}", self.episode, format_elapsed(self.current_secs));
        if self.duration_secs > 0.0 {
            line.push_str(&format!(" / {}", format_elapsed(self.duration_secs)));
        }
        line
    }
}

/// Format seconds as a zero-padded `MM:SS` label.
///
/// Minutes are not capped at 59, so long playback keeps counting (`3661`
/// renders as `"61:01"`). Negative positions floor to `"00:00"`.
pub fn format_elapsed(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Interpret a loose JSON value as non-negative seconds, defaulting to zero.
fn seconds_or_zero(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|secs| secs.is_finite())
        .map(|secs| secs.max(0.0))
        .unwrap_or(0.0)
}

/// Truncate a string to at most `max` characters, respecting char boundaries.
fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
