//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Discord IPC configuration
    pub discord: DiscordSettings,

    /// Presence update behavior
    pub presence: PresenceSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "127.0.0.1")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Discord IPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordSettings {
    /// Discord application client ID (required)
    pub client_id: String,

    /// Explicit IPC socket path, bypassing discovery
    pub ipc_path: Option<String>,

    /// Timeout for individual IPC calls in seconds
    pub call_timeout_secs: u64,
}

/// Presence update behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceSettings {
    /// Fallback image key shown when an event carries no poster URL
    pub large_image_key: String,

    /// Minimum interval between forwarded updates in seconds
    pub min_update_interval_secs: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env); empty allows any origin,
    /// which extension contexts need since their origin is scheme-prefixed
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the Discord client ID is missing.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8731)?
            .set_default("discord.client_id", "")?
            .set_default("discord.call_timeout_secs", 5)?
            .set_default("presence.large_image_key", "")?
            .set_default("presence.min_update_interval_secs", 5)?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=8731 -> server.port = 8731
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option(
                "server.host",
                std::env::var("SERVER_HOST").ok(),
            )?
            .set_override_option(
                "server.port",
                std::env::var("SERVER_PORT").ok(),
            )?
            .set_override_option(
                "discord.client_id",
                std::env::var("DISCORD_CLIENT_ID").ok(),
            )?
            .set_override_option(
                "discord.ipc_path",
                std::env::var("DISCORD_IPC_PATH").ok(),
            )?
            .set_override_option(
                "presence.large_image_key",
                std::env::var("LARGE_IMAGE_KEY").ok(),
            )?
            .set_override_option(
                "presence.min_update_interval_secs",
                std::env::var("MIN_UPDATE_INTERVAL_SECS").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Validate loaded settings.
    ///
    /// The Discord client ID is the only hard requirement; the bridge cannot
    /// open a presence channel without it.
    fn validate(self) -> Result<Self, ConfigError> {
        if self.discord.client_id.trim().is_empty() {
            return Err(ConfigError::Message(
                "DISCORD_CLIENT_ID is not set. Provide your Discord application \
                 client ID via the environment or a config file."
                    .into(),
            ));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DiscordSettings {
    /// Timeout applied to each IPC call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl PresenceSettings {
    /// Minimum interval between forwarded updates.
    pub fn min_update_interval(&self) -> Duration {
        Duration::from_secs(self.min_update_interval_secs)
    }
}
