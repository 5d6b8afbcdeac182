//! Ticket store connection settings.
//!
//! The store sees one small write per lifecycle transition and a single
//! full scan at startup, so the pool stays small and has no idle tuning.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound for `pool_size`.
pub const MAX_POOL_SIZE: u32 = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` URL of the ticket store.
    pub url: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long to wait for a free connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upgrade the schema before reconciling. Legacy stores gain the
    /// `closed` column and the one-open-ticket-per-owner index.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The URL with credentials masked, for logs.
    pub fn redacted_url(&self) -> String {
        match self.url.split_once("://") {
            Some((scheme, rest)) => match rest.rsplit_once('@') {
                Some((_, host)) => format!("{}://***@{}", scheme, host),
                None => self.url.clone(),
            },
            None => self.url.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("TICKETDESK__DATABASE__URL"));
        }
        let scheme = self.url.split_once("://").map(|(scheme, _)| scheme);
        if !matches!(scheme, Some("postgres" | "postgresql")) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.pool_size == 0 || self.pool_size > MAX_POOL_SIZE {
            return Err(ValidationError::InvalidPoolSize {
                got: self.pool_size,
                max: MAX_POOL_SIZE,
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
            run_migrations: default_run_migrations(),
        }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_run_migrations() -> bool {
    true
}
