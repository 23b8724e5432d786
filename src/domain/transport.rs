//! The presence transport seam.
//!
//! The bridge talks to the chat client through this trait so the controller
//! and connection manager can be exercised against mocks. The concrete
//! Discord IPC implementation lives in the infrastructure layer.

use async_trait::async_trait;

use super::presence::PresencePayload;

/// Transport-level failures.
///
/// `ChannelClosed` is the one recoverable kind: the remote client restarted
/// and the local channel went stale. It triggers exactly one
/// reconnect-and-retry in the controller. Everything else is surfaced as-is.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("presence channel closed")]
    ChannelClosed,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Build an `Other` failure from any displayable detail.
    pub fn other(detail: impl Into<String>) -> Self {
        Self::Other(detail.into())
    }

    /// Whether this failure is recoverable by reconnecting.
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed)
    }
}

/// A handle to the chat client's local presence channel.
///
/// All methods may fail; callers decide whether to reconnect based on the
/// error kind. A handle is single-owner: the connection manager replaces it
/// wholesale on reconnect and nothing else may retain a reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Open the channel and perform the protocol handshake.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Publish a presence update.
    async fn update(&mut self, payload: &PresencePayload) -> Result<(), TransportError>;

    /// Remove the presence display.
    async fn clear(&mut self) -> Result<(), TransportError>;

    /// Close the channel. Best-effort; callers discarding the handle ignore
    /// failures.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Constructs fresh transport handles bound to the same client identity.
///
/// Reconnection discards the broken handle and asks the factory for a new
/// one rather than reusing a half-dead connection.
#[cfg_attr(test, mockall::automock)]
pub trait TransportFactory: Send + Sync {
    fn make_transport(&self) -> Box<dyn PresenceTransport>;
}
