//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured filter. Production writes one JSON
//! object per line; every other environment gets the human-readable format.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = build_filter(config);

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn invalid_filter_falls_back_to_info() {
        let config = LoggingConfig {
            environment: Environment::Development,
            filter: "ticketdesk=notalevel".to_string(),
        };
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(build_filter(&config).to_string(), "info");
        }
    }

    #[test]
    fn configured_filter_is_used() {
        let config = LoggingConfig::default();
        if std::env::var("RUST_LOG").is_err() {
            let rendered = build_filter(&config).to_string();
            assert!(rendered.contains("ticketdesk=debug"));
        }
    }
}
