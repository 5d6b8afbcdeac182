//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresTicketStore` - ticket records
//! - `connect` / `run_migrations` - pool construction and schema upgrades

mod ticket_store;

pub use ticket_store::PostgresTicketStore;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Build a connection pool from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    tracing::info!(
        url = %config.redacted_url(),
        pool_size = config.pool_size,
        "Connecting to ticket store"
    );
    PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(config.connect_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database("Failed to connect to database", e))
}

/// Apply pending migrations, including the in-place upgrade of stores that
/// predate the `closed` column.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database("Failed to run migrations", e))
}
