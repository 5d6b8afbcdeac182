//! Ticketdesk startup maintenance.
//!
//! Loads configuration, prepares the ticket store and reconciles it against
//! the guild so that no record points at a channel that is gone. Event
//! delivery is owned by the host process, which drives `ActionDispatcher`.

use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use ticketdesk::adapters::postgres::{self, PostgresTicketStore};
use ticketdesk::adapters::{DiscordRestPlatform, HtmlTranscriptExporter};
use ticketdesk::application::TicketServices;
use ticketdesk::config::AppConfig;
use ticketdesk::domain::foundation::DomainError;
use ticketdesk::ports::{ChatPlatform, PlatformError};
use ticketdesk::telemetry;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Store(#[from] DomainError),

    #[error("platform client: {0}")]
    Platform(#[from] PlatformError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    telemetry::init_tracing(&config.logging);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup maintenance failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!(
        guild_id = %config.platform.guild_id,
        ticket_types = config.tickets.ticket_types.len(),
        "Starting ticketdesk"
    );

    let pool = postgres::connect(&config.database).await?;
    if config.database.run_migrations {
        postgres::run_migrations(&pool).await?;
    }

    let platform: Arc<dyn ChatPlatform> = Arc::new(DiscordRestPlatform::new(&config.platform)?);
    let services = TicketServices {
        store: Arc::new(PostgresTicketStore::new(pool)),
        platform: platform.clone(),
        exporter: Arc::new(HtmlTranscriptExporter::new(platform)),
        config: Arc::new(config.tickets),
        identity: config.platform.identity(),
    };

    let report = services.reconciler().handle().await?;
    if report.errors > 0 {
        tracing::warn!(
            errors = report.errors,
            "Some tickets could not be reconciled and were kept"
        );
    }

    Ok(())
}
