//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - in-memory ticket store (tests, local runs)
//! - `postgres` - PostgreSQL ticket store and migrations
//! - `discord` - Discord REST chat platform
//! - `platform` - mock chat platform with failure injection
//! - `transcript` - HTML transcript exporter

pub mod discord;
pub mod memory;
pub mod platform;
pub mod postgres;
pub mod transcript;

pub use discord::DiscordRestPlatform;
pub use memory::InMemoryTicketStore;
pub use platform::MockChatPlatform;
pub use postgres::PostgresTicketStore;
pub use transcript::HtmlTranscriptExporter;
