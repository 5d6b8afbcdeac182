//! CloseTicketHandler - Command handler for closing a ticket.
//!
//! Closing is a sequence of independent steps. Only the store write is
//! fatal; every other step degrades on failure, gets logged and is reported
//! in the result.
//!
//! A ticket is `Closing` from the moment a close claims it until the
//! sequence ends. A second close in that window is refused.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::{ServiceIdentity, TicketingConfig};
use crate::domain::foundation::{ChannelId, StateMachine, Timestamp};
use crate::domain::ticket::{
    custom_id, Actor, Ticket, TicketAction, TicketError, TicketPolicy, TicketStatus,
};
use crate::ports::{
    Channel, ChatPlatform, OutgoingMessage, OverwriteTarget, Permission, PermissionOverwrite,
    PlatformError, TicketStore, Transcript, TranscriptExporter,
};

use super::load_ticket;
use crate::application::delivery::{DeliveryFanout, DeliveryOutcome, RecipientTarget};
use crate::application::messages;

/// Delay between the closing notice and the actual close.
pub const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How many recent messages to search for the control message.
const CONTROL_MESSAGE_SCAN: u8 = 10;

/// Best-effort steps of the close sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStep {
    DisableCloseButton,
    GraceNotice,
    RevokeAccess,
    Rename,
    ExportTranscript,
    PostSummary,
}

impl fmt::Display for CloseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseStep::DisableCloseButton => "disable close button",
            CloseStep::GraceNotice => "grace notice",
            CloseStep::RevokeAccess => "revoke access",
            CloseStep::Rename => "rename channel",
            CloseStep::ExportTranscript => "export transcript",
            CloseStep::PostSummary => "post summary",
        };
        write!(f, "{}", s)
    }
}

/// Tickets with a close sequence in flight.
#[derive(Debug, Default)]
struct InFlightCloses(Mutex<HashSet<ChannelId>>);

impl InFlightCloses {
    /// `None` if another close already holds `channel_id`.
    fn claim(self: &Arc<Self>, channel_id: ChannelId) -> Option<CloseClaim> {
        let mut closing = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        closing.insert(channel_id).then(|| CloseClaim {
            closes: Arc::clone(self),
            channel_id,
        })
    }
}

/// Released on drop, whether the sequence finished, failed or was cancelled.
struct CloseClaim {
    closes: Arc<InFlightCloses>,
    channel_id: ChannelId,
}

impl Drop for CloseClaim {
    fn drop(&mut self) {
        self.closes
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.channel_id);
    }
}

/// Command to close a ticket.
#[derive(Debug, Clone)]
pub struct CloseTicketCommand {
    pub actor: Actor,
    pub channel_id: ChannelId,
}

/// Result of a close. The ticket is closed in the store whenever this is
/// returned; `degraded` lists the steps that did not complete.
#[derive(Debug, Clone)]
pub struct CloseTicketResult {
    pub ticket: Ticket,
    pub closed_at: Timestamp,
    /// Filename of the exported transcript.
    pub transcript: Option<String>,
    pub summary_posted: bool,
    pub deliveries: Vec<DeliveryOutcome>,
    pub degraded: Vec<CloseStep>,
}

impl CloseTicketResult {
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty() && self.deliveries.iter().all(DeliveryOutcome::is_delivered)
    }
}

/// Handler for closing tickets.
pub struct CloseTicketHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
    exporter: Arc<dyn TranscriptExporter>,
    fanout: DeliveryFanout,
    config: Arc<TicketingConfig>,
    identity: ServiceIdentity,
    policy: TicketPolicy,
    in_flight: Arc<InFlightCloses>,
}

impl CloseTicketHandler {
    pub fn new(
        store: Arc<dyn TicketStore>,
        platform: Arc<dyn ChatPlatform>,
        exporter: Arc<dyn TranscriptExporter>,
        config: Arc<TicketingConfig>,
        identity: ServiceIdentity,
    ) -> Self {
        let fanout = DeliveryFanout::new(platform.clone(), config.audit_channel_id);
        Self {
            store,
            platform,
            exporter,
            fanout,
            config,
            identity,
            policy: TicketPolicy,
            in_flight: Arc::default(),
        }
    }

    pub async fn handle(&self, cmd: CloseTicketCommand) -> Result<CloseTicketResult, TicketError> {
        let channel_id = cmd.channel_id;

        // 1. Claim, load, check state and authorize
        let _claim = self
            .in_flight
            .claim(channel_id)
            .ok_or_else(|| TicketError::invalid_state("This ticket is already being closed."))?;
        let mut ticket = load_ticket(self.store.as_ref(), channel_id).await?;
        ticket
            .status()
            .transition_to(TicketStatus::Closing)
            .map_err(|_| TicketError::invalid_state("This ticket is already closed."))?;
        self.policy.can_act(
            cmd.actor.id,
            &ticket,
            TicketAction::Close,
            self.config.is_admin(&cmd.actor),
        )?;

        let mut degraded = Vec::new();

        // 2. Disable the close button on the control message
        match self.disable_close_button(channel_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(channel_id = %channel_id, "Control message not found");
                degraded.push(CloseStep::DisableCloseButton);
            }
            Err(e) => {
                warn_step(channel_id, CloseStep::DisableCloseButton, &e);
                degraded.push(CloseStep::DisableCloseButton);
            }
        }

        // 3. Grace period
        let notice = messages::grace_notice(&cmd.actor.tag, CLOSE_GRACE_PERIOD.as_secs());
        if let Err(e) = self.platform.send_message(channel_id, &notice).await {
            warn_step(channel_id, CloseStep::GraceNotice, &e);
            degraded.push(CloseStep::GraceNotice);
        }
        tokio::time::sleep(CLOSE_GRACE_PERIOD).await;

        // 4. Revoke member access
        if !self.revoke_access(&ticket).await {
            degraded.push(CloseStep::RevokeAccess);
        }

        // 5. Persist
        self.store.set_closed(channel_id).await?;
        ticket.close();
        let closed_at = Timestamp::now();

        // 6. Rename
        let channel = self.current_channel(channel_id).await;
        let renamed = match &channel {
            Some(c) => {
                let name = format!("{}{}", c.name, messages::CLOSED_SUFFIX);
                match self.platform.rename_channel(channel_id, &name).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn_step(channel_id, CloseStep::Rename, &e);
                        false
                    }
                }
            }
            None => false,
        };
        if !renamed {
            degraded.push(CloseStep::Rename);
        }

        // 7. Export
        let transcript = match &channel {
            Some(c) => self.export(c).await,
            None => None,
        };
        if transcript.is_none() {
            degraded.push(CloseStep::ExportTranscript);
        }

        // 8. Summary in the ticket channel
        let summary = messages::closure_summary(&ticket, &cmd.actor.tag, closed_at);
        let mut post =
            OutgoingMessage::embed(summary.clone()).with_buttons(messages::closure_buttons());
        if let Some(t) = &transcript {
            post = post.with_attachment(t.to_attachment());
        }
        let summary_posted = match self.platform.send_message(channel_id, &post).await {
            Ok(_) => true,
            Err(e) => {
                warn_step(channel_id, CloseStep::PostSummary, &e);
                degraded.push(CloseStep::PostSummary);
                false
            }
        };

        // 9. Fan out to owner, participants and the audit channel
        let mut notification = OutgoingMessage::embed(summary);
        if let Some(t) = &transcript {
            notification = notification.with_attachment(t.to_attachment());
        }
        let deliveries = self
            .fanout
            .deliver(&recipients(&ticket, self.config.audit_channel_id), &notification)
            .await;

        tracing::info!(
            channel_id = %channel_id,
            closed_by = %cmd.actor.id,
            degraded = degraded.len(),
            failed_deliveries = deliveries.iter().filter(|d| !d.is_delivered()).count(),
            "Ticket closed"
        );

        Ok(CloseTicketResult {
            ticket,
            closed_at,
            transcript: transcript.map(|t| t.filename),
            summary_posted,
            deliveries,
            degraded,
        })
    }

    /// False when no control message is among the recent messages.
    async fn disable_close_button(&self, channel_id: ChannelId) -> Result<bool, PlatformError> {
        let recent = self
            .platform
            .fetch_messages(channel_id, None, CONTROL_MESSAGE_SCAN)
            .await?;
        let Some(control) = recent
            .into_iter()
            .find(|m| m.author_id == self.identity.user_id && !m.buttons.is_empty())
        else {
            return Ok(false);
        };

        let buttons: Vec<_> = control
            .buttons
            .into_iter()
            .map(|b| {
                if b.is(custom_id::CLOSE_TICKET) {
                    b.disabled()
                } else {
                    b
                }
            })
            .collect();
        self.platform
            .edit_message_buttons(channel_id, control.id, &buttons)
            .await?;
        Ok(true)
    }

    /// Returns false if any member kept access.
    async fn revoke_access(&self, ticket: &Ticket) -> bool {
        let mut all_revoked = true;
        for member in ticket.members() {
            let overwrite = PermissionOverwrite::deny(
                OverwriteTarget::Member(member),
                vec![Permission::ViewChannel, Permission::SendMessages],
            );
            if let Err(e) = self
                .platform
                .edit_permissions(ticket.channel_id(), &overwrite)
                .await
            {
                tracing::warn!(
                    channel_id = %ticket.channel_id(),
                    user_id = %member,
                    error = %e,
                    "Failed to revoke ticket access"
                );
                all_revoked = false;
            }
        }
        all_revoked
    }

    async fn current_channel(&self, channel_id: ChannelId) -> Option<Channel> {
        match self.platform.fetch_channel(channel_id).await {
            Ok(Some(c)) if c.viewable => Some(c),
            Ok(_) => {
                tracing::warn!(channel_id = %channel_id, "Ticket channel vanished during close");
                None
            }
            Err(e) => {
                tracing::warn!(
                    channel_id = %channel_id,
                    error = %e,
                    "Failed to fetch ticket channel"
                );
                None
            }
        }
    }

    async fn export(&self, channel: &Channel) -> Option<Transcript> {
        match self.exporter.export(channel).await {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(
                    channel_id = %channel.id,
                    error = %e,
                    "Transcript export failed"
                );
                None
            }
        }
    }
}

fn recipients(ticket: &Ticket, audit_channel_id: ChannelId) -> Vec<RecipientTarget> {
    let mut recipients: Vec<RecipientTarget> = ticket
        .members()
        .into_iter()
        .map(RecipientTarget::Direct)
        .collect();
    recipients.push(RecipientTarget::Channel(audit_channel_id));
    recipients
}

fn warn_step(channel_id: ChannelId, step: CloseStep, error: &PlatformError) {
    tracing::warn!(channel_id = %channel_id, step = %step, error = %error, "Close step failed");
}
