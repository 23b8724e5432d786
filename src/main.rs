//! # Presence Bridge
//!
//! A local bridge between a browser extension and Discord Rich Presence.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Discord IPC connection manager
//! - HTTP server

use anyhow::Result;
use tracing::info;

use presence_bridge::config::Settings;
use presence_bridge::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    presence_bridge::telemetry::init_tracing();

    info!("Starting Presence Bridge...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Watching for activity from the browser extension");
    application.run_until_stopped().await?;

    Ok(())
}
