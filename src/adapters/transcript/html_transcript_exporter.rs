//! HTML transcript exporter.
//!
//! Reads the whole channel history through the `ChatPlatform` port, one page
//! of 100 at a time walking backwards with `before` cursors, and renders a
//! self-contained HTML page, oldest message first.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::MessageId;
use crate::ports::{
    Channel, ChannelMessage, ChatPlatform, ExportError, Transcript, TranscriptExporter,
};

/// Largest page the platform serves.
pub const HISTORY_PAGE_SIZE: u8 = 100;

/// Renders channel history as a standalone HTML document.
pub struct HtmlTranscriptExporter {
    platform: Arc<dyn ChatPlatform>,
}

impl HtmlTranscriptExporter {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Every message in the channel, oldest first.
    async fn read_history(&self, channel: &Channel) -> Result<Vec<ChannelMessage>, ExportError> {
        let mut history = Vec::new();
        let mut before: Option<MessageId> = None;

        loop {
            let page = self
                .platform
                .fetch_messages(channel.id, before, HISTORY_PAGE_SIZE)
                .await?;
            let Some(oldest) = page.last() else {
                break;
            };
            // Guard against a platform that ignores the cursor.
            if before.is_some_and(|b| oldest.id >= b) {
                break;
            }
            before = Some(oldest.id);
            history.extend(page);
        }

        history.reverse();
        Ok(history)
    }
}

#[async_trait]
impl TranscriptExporter for HtmlTranscriptExporter {
    async fn export(&self, channel: &Channel) -> Result<Transcript, ExportError> {
        let history = self.read_history(channel).await?;
        let html = render(&channel.name, &history)?;

        tracing::debug!(
            channel_id = %channel.id,
            messages = history.len(),
            bytes = html.len(),
            "Transcript rendered"
        );

        Ok(Transcript {
            filename: format!("{}.html", channel.name),
            content: html.into_bytes(),
            message_count: history.len(),
        })
    }
}

fn render(channel_name: &str, history: &[ChannelMessage]) -> Result<String, ExportError> {
    let render_err = |e: std::fmt::Error| ExportError::Render(e.to_string());
    let mut out = String::new();

    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{name}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1>#{name}</h1><p>{count} messages</p></header>\n<main>\n",
        name = escape(channel_name),
        count = history.len(),
    )
    .map_err(render_err)?;

    for message in history {
        render_message(&mut out, message).map_err(render_err)?;
    }

    out.push_str("</main>\n</body>\n</html>\n");
    Ok(out)
}

fn render_message(out: &mut String, message: &ChannelMessage) -> std::fmt::Result {
    writeln!(
        out,
        "<article class=\"message\" id=\"m{id}\">\n\
         <div class=\"meta\"><span class=\"author\">{author}</span> \
         <time datetime=\"{iso}\">{shown}</time></div>",
        id = message.id,
        author = escape(&message.author_name),
        iso = message.timestamp.as_datetime().to_rfc3339(),
        shown = message.timestamp,
    )?;

    if !message.content.is_empty() {
        writeln!(
            out,
            "<div class=\"content\">{}</div>",
            escape(&message.content).replace('\n', "<br>")
        )?;
    }

    for embed in &message.embeds {
        writeln!(
            out,
            "<div class=\"embed\" style=\"border-color:#{:06x}\">",
            embed.color
        )?;
        if !embed.title.is_empty() {
            writeln!(out, "<div class=\"embed-title\">{}</div>", escape(&embed.title))?;
        }
        if !embed.description.is_empty() {
            writeln!(
                out,
                "<div class=\"embed-description\">{}</div>",
                escape(&embed.description).replace('\n', "<br>")
            )?;
        }
        for field in &embed.fields {
            writeln!(
                out,
                "<div class=\"embed-field\"><b>{}</b> {}</div>",
                escape(&field.name),
                escape(&field.value)
            )?;
        }
        out.push_str("</div>\n");
    }

    for url in &message.attachment_urls {
        writeln!(
            out,
            "<div class=\"attachment\"><a href=\"{0}\">{0}</a></div>",
            escape(url)
        )?;
    }

    out.push_str("</article>\n");
    Ok(())
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = "body{font-family:sans-serif;background:#313338;color:#dbdee1;margin:0}\
header{padding:16px;border-bottom:1px solid #1e1f22}\
.message{padding:8px 16px}.author{font-weight:bold;color:#fff}\
time{color:#949ba4;font-size:12px}\
.embed{border-left:4px solid;padding:4px 8px;margin-top:4px;background:#2b2d31}\
.embed-title{font-weight:bold}a{color:#00a8fc}";
