//! Messages the workflow posts.
//!
//! Builders for the control message, closure and transcript summaries and
//! the audit notices. Everything here is pure; handlers decide where the
//! result goes.

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::ticket::{custom_id, Ticket, TicketType};
use crate::ports::{Button, ButtonStyle, Embed, OutgoingMessage};

pub const CLOSED_COLOR: u32 = 0xff4d4d;
pub const TRANSCRIPT_COLOR: u32 = 0xa4c8fd;
pub const CONTROL_COLOR: u32 = 0x5865f2;
pub const AUDIT_COLOR: u32 = 0xffb347;

/// Appended to the channel name on close.
pub const CLOSED_SUFFIX: &str = " 🔒";
/// Appended to the channel name on save.
pub const SAVED_SUFFIX: &str = " 📂";

pub const DOWNLOAD_LABEL: &str = "Download transcript";

pub fn mention(user_id: UserId) -> String {
    format!("<@{}>", user_id)
}

/// `ticket-<username>`, with any legacy `#discriminator` dropped.
pub fn channel_name_for(tag: &str) -> String {
    let username = tag.split('#').next().unwrap_or(tag);
    let slug = username
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("ticket-{}", slug)
}

/// Posted into a fresh ticket channel.
pub fn control_message(owner_id: UserId, ticket_type: &TicketType) -> OutgoingMessage {
    let description = if ticket_type.description.is_empty() {
        "Support will be with you shortly.".to_string()
    } else {
        format!("{}\n\nSupport will be with you shortly.", ticket_type.description)
    };

    OutgoingMessage::embed(Embed::new(
        format!("Ticket: {}", ticket_type.name),
        description,
        CONTROL_COLOR,
    ))
    .with_content(format!("{} welcome to your ticket.", mention(owner_id)))
    .with_buttons(vec![
        Button::action(custom_id::CLOSE_TICKET, "Close", ButtonStyle::Danger),
        Button::action(custom_id::ADD_USER, "Add user", ButtonStyle::Secondary),
        Button::action(custom_id::PRINT_TICKET, "Print", ButtonStyle::Primary),
    ])
}

pub fn grace_notice(closer_tag: &str, seconds: u64) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "🔒 This ticket will be closed in {} seconds by {}.",
        seconds, closer_tag
    ))
}

pub fn participant_added(user_id: UserId, reason: &str) -> OutgoingMessage {
    let reason = if reason.trim().is_empty() {
        "No reason given"
    } else {
        reason
    };
    OutgoingMessage::text(format!(
        "🔔 {} was added to the ticket.\nReason: {}",
        mention(user_id),
        reason
    ))
}

fn participants_field(ticket: &Ticket) -> String {
    if ticket.participants().is_empty() {
        return "None".to_string();
    }
    ticket
        .participants()
        .iter()
        .map(|id| mention(*id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summary posted on close and fanned out with the transcript.
pub fn closure_summary(ticket: &Ticket, closer_tag: &str, closed_at: Timestamp) -> Embed {
    Embed::new("Ticket closed", "", CLOSED_COLOR)
        .field("Owner", mention(ticket.owner_id()), true)
        .field("Closed by", closer_tag, true)
        .field("Closed at", closed_at.to_markup(), true)
        .field("Participants", participants_field(ticket), false)
}

/// Admin actions offered under the closure summary.
pub fn closure_buttons() -> Vec<Button> {
    vec![
        Button::action(custom_id::DELETE_TICKET, "Delete", ButtonStyle::Danger),
        Button::action(custom_id::SAVE_TICKET, "Save", ButtonStyle::Success),
    ]
}

pub fn transcript_summary(ticket: &Ticket, requester_tag: &str, requested_at: Timestamp) -> Embed {
    Embed::new("Ticket transcript", "", TRANSCRIPT_COLOR)
        .field("Owner", mention(ticket.owner_id()), true)
        .field("Requested by", requester_tag, true)
        .field("Requested at", requested_at.to_markup(), true)
        .field("Participants", participants_field(ticket), false)
}

/// Posted to the audit channel when a direct message bounces.
pub fn delivery_failure_notice(recipient: UserId, cause: &str) -> OutgoingMessage {
    OutgoingMessage::embed(
        Embed::new(
            "Direct message failed",
            format!("Could not deliver a direct message to {}.", mention(recipient)),
            AUDIT_COLOR,
        )
        .field("Cause", cause, false),
    )
}

pub fn download_button(url: impl Into<String>) -> Button {
    Button::link(url, DOWNLOAD_LABEL)
}
