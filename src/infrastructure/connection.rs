//! Connection lifecycle management for the presence channel.
//!
//! One `ConnectionManager` owns the single transport handle for the whole
//! process. Every connect, reconnect, and transport call goes through its
//! mutex, so two concurrent requests can never race to install different
//! handles.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::presence::PresencePayload;
use crate::domain::transport::{PresenceTransport, TransportError, TransportFactory};

struct Inner {
    transport: Box<dyn PresenceTransport>,
    connected: bool,
}

/// Exclusive owner of the presence transport handle.
pub struct ConnectionManager {
    factory: Box<dyn TransportFactory>,
    inner: Mutex<Inner>,
}

impl ConnectionManager {
    /// Create a manager with an initial, not-yet-connected handle.
    pub fn new(factory: Box<dyn TransportFactory>) -> Self {
        let transport = factory.make_transport();
        Self {
            factory,
            inner: Mutex::new(Inner {
                transport,
                connected: false,
            }),
        }
    }

    /// Connect the current handle if it is not already connected.
    ///
    /// No-op when connected. On failure the manager stays disconnected and
    /// the error propagates; the next request retries from scratch.
    pub async fn ensure_connected(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        if inner.connected {
            return Ok(());
        }

        match inner.transport.connect().await {
            Ok(()) => {
                inner.connected = true;
                debug!("Presence channel connected");
                Ok(())
            }
            Err(err) => {
                inner.connected = false;
                warn!(error = %err, "Connection attempt failed");
                Err(err)
            }
        }
    }

    /// Recovery path for a broken channel.
    ///
    /// Best-effort closes the existing handle, discards it, and connects a
    /// brand-new handle bound to the same client identity.
    pub async fn reconnect(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;

        if inner.connected {
            if let Err(err) = inner.transport.close().await {
                debug!(error = %err, "Ignoring close failure on stale handle");
            }
        }
        inner.connected = false;
        inner.transport = self.factory.make_transport();

        match inner.transport.connect().await {
            Ok(()) => {
                inner.connected = true;
                info!("Successfully reconnected to the presence channel");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Reconnection failed");
                Err(err)
            }
        }
    }

    /// Publish an update through the current handle.
    pub async fn update(&self, payload: &PresencePayload) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        inner.transport.update(payload).await
    }

    /// Clear the presence display through the current handle.
    pub async fn clear(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        inner.transport.clear().await
    }

    /// Whether the channel is currently believed connected.
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.connected
    }

    /// Best-effort close on shutdown.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.connected {
            if let Err(err) = inner.transport.close().await {
                debug!(error = %err, "Ignoring close failure during shutdown");
            }
        }
        inner.connected = false;
    }
}
