//! Logging configuration

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::ValidationError;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Environment name; production switches output to JSON
    #[serde(default)]
    pub environment: Environment,

    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,
}

/// Application environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl LoggingConfig {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Validate logging configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        EnvFilter::try_new(&self.filter)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidLogFilter(e.to_string()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info,ticketdesk=debug,sqlx=warn".to_string()
}
