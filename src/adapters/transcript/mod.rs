//! Transcript exporters.

mod html_transcript_exporter;

pub use html_transcript_exporter::{HtmlTranscriptExporter, HISTORY_PAGE_SIZE};
