//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::presence_service::PresenceService;
use crate::config::Settings;
use crate::infrastructure::connection::ConnectionManager;
use crate::infrastructure::discord::DiscordTransportFactory;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PresenceService>,
    pub connection: Arc<ConnectionManager>,
    pub settings: Arc<Settings>,
}

/// Wire up the connection manager and presence controller from settings.
pub fn build_state(settings: Settings) -> AppState {
    let factory = DiscordTransportFactory::new(&settings.discord);
    let connection = Arc::new(ConnectionManager::new(Box::new(factory)));
    let service = Arc::new(PresenceService::new(
        connection.clone(),
        &settings.presence,
    ));

    AppState {
        service,
        connection,
        settings: Arc::new(settings),
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let state = build_state(settings);

        // Connect eagerly so presence shows up before the first event.
        // Discord not running yet is not fatal; the first request retries.
        match state.connection.ensure_connected().await {
            Ok(()) => tracing::info!("Connected to the Discord client"),
            Err(err) => {
                tracing::warn!(error = %err, "Discord is not reachable yet; will retry on the first event")
            }
        }

        // Build router with middleware
        let router = routes::create_router(state.clone())
            .layer(logging::create_trace_layer())
            .layer(cors::create_cors_layer(&state.settings.cors));

        // Bind to address
        let addr = state.settings.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Run the server until stopped, then close the presence channel.
    pub async fn run_until_stopped(self) -> Result<()> {
        let connection = self.state.connection.clone();

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        connection.close().await;
        tracing::info!("Presence channel closed, shutting down");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install the shutdown signal handler");
    }
}
