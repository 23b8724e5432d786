//! Presence session state and update admission control.
//!
//! A session spans from the first update after startup (or a successful
//! clear) until the next successful clear. Its start time anchors the
//! remote elapsed-time display and must stay fixed for the session's life.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Mutable presence session state. One instance per process, guarded by the
/// caller's lock.
#[derive(Debug, Default)]
pub struct SessionState {
    last_update_at: Option<Instant>,
    session_start: Option<DateTime<Utc>>,
}

/// Outcome of the admission check for an inbound update.
#[derive(Debug)]
pub enum Admission {
    /// The update may be forwarded. The ticket holds rollback state in case
    /// the transport call ultimately fails.
    Admitted(UpdateTicket),

    /// The update arrived inside the minimum interval and is downgraded to a
    /// no-op; `retry_in` is the remaining wait.
    Throttled { retry_in: Duration },
}

/// Reservation of the update slot taken at admission time.
///
/// Admission stamps `last_update_at` immediately, so a concurrent request
/// inside the window is throttled instead of double-forwarded. If the
/// transport call fails the stamp is rolled back through this ticket.
#[derive(Debug)]
pub struct UpdateTicket {
    previous: Option<Instant>,
    stamped: Instant,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the session if no session is currently open, returning the
    /// (possibly pre-existing) start anchor.
    pub fn open_session(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.session_start.get_or_insert(now)
    }

    /// Close the session. Called only after a successful clear.
    pub fn close_session(&mut self) {
        self.session_start = None;
    }

    /// Current session start, if a session is open.
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    /// Decide whether an update arriving at `now` may be forwarded.
    ///
    /// The first update ever is treated as infinitely stale. An admitted
    /// update reserves the slot by stamping `last_update_at` right away.
    pub fn admit(&mut self, now: Instant, min_interval: Duration) -> Admission {
        if let Some(last) = self.last_update_at {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < min_interval {
                return Admission::Throttled {
                    retry_in: min_interval - elapsed,
                };
            }
        }

        let ticket = UpdateTicket {
            previous: self.last_update_at,
            stamped: now,
        };
        self.last_update_at = Some(now);
        Admission::Admitted(ticket)
    }

    /// Undo an admission whose transport call failed.
    ///
    /// A later request may have re-stamped the slot in the meantime; in that
    /// case the newer stamp wins and the rollback is a no-op.
    pub fn roll_back(&mut self, ticket: UpdateTicket) {
        if self.last_update_at == Some(ticket.stamped) {
            self.last_update_at = ticket.previous;
        }
    }
}
