//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `TicketStore` - durable ticket records
//! - `ChatPlatform` - channels, permissions, messages and members
//! - `TranscriptExporter` - channel history archives

mod chat_platform;
mod ticket_store;
mod transcript_exporter;

pub use chat_platform::{
    Attachment, Button, ButtonStyle, Channel, ChannelMessage, ChannelSpec, ChatPlatform, Embed,
    EmbedField, Member, OutgoingMessage, OverwriteTarget, Permission, PermissionOverwrite,
    PlatformError, SentMessage,
};
pub use ticket_store::TicketStore;
pub use transcript_exporter::{ExportError, Transcript, TranscriptExporter};
