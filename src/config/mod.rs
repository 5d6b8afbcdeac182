//! Application configuration module
//!
//! Type-safe configuration loaded with the `config` and `dotenvy` crates.
//! An optional TOML file is read first (`TICKETDESK_CONFIG`, default
//! `ticketdesk.toml`), then environment variables with the `TICKETDESK`
//! prefix override it. Nested values use `__` as separator.
//!
//! # Example
//!
//! ```no_run
//! use ticketdesk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod logging;
mod platform;
mod tickets;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{Environment, LoggingConfig};
pub use platform::{PlatformConfig, ServiceIdentity};
pub use tickets::TicketingConfig;

use serde::Deserialize;
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "TICKETDESK_CONFIG";

/// File read when `TICKETDESK_CONFIG` is unset. Missing is not an error.
pub const DEFAULT_CONFIG_FILE: &str = "ticketdesk.toml";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Ticket store (PostgreSQL)
    pub database: DatabaseConfig,

    /// Chat platform REST access
    pub platform: PlatformConfig,

    /// Ticket types, admin role and audit channel
    pub tickets: TicketingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the configured file and the environment
    ///
    /// # Environment Variable Format
    ///
    /// - `TICKETDESK__DATABASE__URL=...` -> `database.url = ...`
    /// - `TICKETDESK__TICKETS__ADMIN_ROLE_ID=123` -> `tickets.admin_role_id = 123`
    ///
    /// Ticket types are lists and are best kept in the file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required values are missing or cannot be
    /// parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(path)
    }

    /// Load from an explicit file path, still applying environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::default()
                    .prefix("TICKETDESK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, section by section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.platform.validate()?;
        self.tickets.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.logging.is_production()
    }
}
