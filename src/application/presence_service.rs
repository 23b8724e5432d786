//! Presence Controller
//!
//! Drives the presence session state machine: builds outbound payloads from
//! inbound events, applies rate-limit admission control, and classifies
//! transport failures into "reconnect once" versus "surface to the caller".

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::PresenceSettings;
use crate::domain::playback::{PlaybackEvent, PlaybackStatus};
use crate::domain::presence::PresencePayload;
use crate::domain::session::{Admission, SessionState};
use crate::domain::transport::TransportError;
use crate::infrastructure::connection::ConnectionManager;
use crate::infrastructure::metrics;

/// Outcome of an accepted update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update reached the chat client. `reconnected` marks the
    /// channel-closed recovery path.
    Forwarded { reconnected: bool },

    /// The update arrived inside the minimum interval and was not forwarded.
    Skipped { retry_in: Duration },
}

/// Outcome of a successful clear request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutcome {
    pub reconnected: bool,
}

/// Presence controller errors.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The presence controller. One instance per process.
pub struct PresenceService {
    connection: Arc<ConnectionManager>,
    session: Mutex<SessionState>,
    fallback_image: String,
    min_update_interval: Duration,
}

impl PresenceService {
    pub fn new(connection: Arc<ConnectionManager>, presence: &PresenceSettings) -> Self {
        Self {
            connection,
            session: Mutex::new(SessionState::new()),
            fallback_image: presence.large_image_key.clone(),
            min_update_interval: presence.min_update_interval(),
        }
    }

    /// Handle an inbound playback update.
    ///
    /// Opens the session lazily, applies admission control, and forwards the
    /// payload. A channel-closed failure triggers exactly one
    /// reconnect-and-retry; the retry never re-checks admission so a
    /// just-reconnected update is not lost to a stale clock.
    pub async fn update(&self, event: PlaybackEvent) -> Result<UpdateOutcome, PresenceError> {
        let status = PlaybackStatus::from_event(event);
        if status.paused {
            debug!(title = %status.title, "Playback reported paused");
        }

        // Anchor creation precedes admission: a throttled first update still
        // opens the session.
        let (session_start, admission) = {
            let mut session = self.session.lock();
            let session_start = session.open_session(Utc::now());
            let admission = session.admit(Instant::now(), self.min_update_interval);
            (session_start, admission)
        };

        let ticket = match admission {
            Admission::Throttled { retry_in } => {
                metrics::record_update_skipped();
                debug!(retry_in_secs = retry_in.as_secs_f64(), "Update throttled");
                return Ok(UpdateOutcome::Skipped { retry_in });
            }
            Admission::Admitted(ticket) => ticket,
        };

        let payload = PresencePayload::from_status(&status, &self.fallback_image, session_start);

        match self.forward_update(&payload).await {
            Ok(reconnected) => {
                metrics::record_update_forwarded();
                Ok(UpdateOutcome::Forwarded { reconnected })
            }
            Err(err) => {
                // The slot reservation only sticks for updates that reached
                // the client.
                self.session.lock().roll_back(ticket);
                metrics::record_transport_failure("update");
                warn!(error = %err, "Error updating presence");
                Err(err.into())
            }
        }
    }

    /// Handle a clear request.
    ///
    /// The session closes only when the clear actually took effect; a failed
    /// clear leaves the session (and its anchor) open.
    pub async fn clear(&self) -> Result<ClearOutcome, PresenceError> {
        match self.forward_clear().await {
            Ok(reconnected) => {
                self.session.lock().close_session();
                Ok(ClearOutcome { reconnected })
            }
            Err(err) => {
                metrics::record_transport_failure("clear");
                warn!(error = %err, "Error clearing presence");
                Err(err.into())
            }
        }
    }

    async fn forward_update(&self, payload: &PresencePayload) -> Result<bool, TransportError> {
        self.connection.ensure_connected().await?;
        match self.connection.update(payload).await {
            Ok(()) => Ok(false),
            Err(err) if err.is_channel_closed() => {
                warn!("Presence channel closed, attempting to reconnect");
                metrics::record_reconnect();
                self.connection.reconnect().await?;
                self.connection.update(payload).await?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    async fn forward_clear(&self) -> Result<bool, TransportError> {
        self.connection.ensure_connected().await?;
        match self.connection.clear().await {
            Ok(()) => Ok(false),
            Err(err) if err.is_channel_closed() => {
                warn!("Presence channel closed, attempting to reconnect");
                metrics::record_reconnect();
                self.connection.reconnect().await?;
                self.connection.clear().await?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }
}
