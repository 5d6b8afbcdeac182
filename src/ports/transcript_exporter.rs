//! Transcript exporter port.
//!
//! Turns a channel's entire message history into a single downloadable
//! artifact. The workflow treats the result as an opaque file.

use async_trait::async_trait;
use thiserror::Error;

use super::{Attachment, Channel, PlatformError};

/// Port for exporting channel history.
///
/// # Contract
///
/// Implementations must:
/// - include the full history, oldest message first, with no truncation
/// - name the artifact after the channel
#[async_trait]
pub trait TranscriptExporter: Send + Sync {
    async fn export(&self, channel: &Channel) -> Result<Transcript, ExportError>;
}

/// An exported transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub filename: String,
    pub content: Vec<u8>,
    /// Number of messages rendered.
    pub message_count: usize,
}

impl Transcript {
    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            filename: self.filename.clone(),
            content: self.content.clone(),
        }
    }
}

/// Errors that can occur during export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Reading the history failed.
    #[error("failed to read channel history: {0}")]
    History(#[from] PlatformError),

    /// Rendering failed.
    #[error("failed to render transcript: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_exporter_is_object_safe() {
        fn _accepts_dyn(_exporter: &dyn TranscriptExporter) {}
    }

    #[test]
    fn transcript_becomes_attachment() {
        let transcript = Transcript {
            filename: "ticket-alice.html".to_string(),
            content: b"<html></html>".to_vec(),
            message_count: 0,
        };
        let attachment = transcript.to_attachment();
        assert_eq!(attachment.filename, "ticket-alice.html");
        assert_eq!(attachment.content, b"<html></html>".to_vec());
    }
}
