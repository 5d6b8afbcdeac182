//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Timeouts must be at least one second")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Store pool size must be between 1 and {max}, got {got}")]
    InvalidPoolSize { got: u32, max: u32 },

    #[error("Platform API base URL must be http(s)")]
    InvalidApiBaseUrl,

    #[error("At least one ticket type must be configured")]
    NoTicketTypes,

    #[error("Ticket type '{name}' is invalid: {reason}")]
    InvalidTicketType { name: String, reason: String },

    #[error("Two ticket types share the menu value '{0}'")]
    DuplicateTicketType(String),

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
