//! PrintTicketHandler - Command handler for sending a transcript on demand.

use std::sync::Arc;

use crate::config::TicketingConfig;
use crate::domain::foundation::{ChannelId, Timestamp};
use crate::domain::ticket::{Actor, TicketAction, TicketError, TicketPolicy};
use crate::ports::{ChatPlatform, OutgoingMessage, TicketStore, TranscriptExporter};

use super::load_ticket;
use crate::application::delivery::{DeliveryFanout, DeliveryOutcome, RecipientTarget};
use crate::application::messages;

/// Command to print a ticket's transcript to the requester.
#[derive(Debug, Clone)]
pub struct PrintTicketCommand {
    pub actor: Actor,
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone)]
pub struct PrintTicketResult {
    pub transcript: String,
    pub message_count: usize,
    pub delivery: DeliveryOutcome,
}

/// Handler for printing tickets.
pub struct PrintTicketHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
    exporter: Arc<dyn TranscriptExporter>,
    fanout: DeliveryFanout,
    config: Arc<TicketingConfig>,
    policy: TicketPolicy,
}

impl PrintTicketHandler {
    pub fn new(
        store: Arc<dyn TicketStore>,
        platform: Arc<dyn ChatPlatform>,
        exporter: Arc<dyn TranscriptExporter>,
        config: Arc<TicketingConfig>,
    ) -> Self {
        let fanout = DeliveryFanout::new(platform.clone(), config.audit_channel_id);
        Self {
            store,
            platform,
            exporter,
            fanout,
            config,
            policy: TicketPolicy,
        }
    }

    pub async fn handle(&self, cmd: PrintTicketCommand) -> Result<PrintTicketResult, TicketError> {
        // 1. Load and authorize
        let ticket = load_ticket(self.store.as_ref(), cmd.channel_id).await?;
        self.policy.can_act(
            cmd.actor.id,
            &ticket,
            TicketAction::Print,
            self.config.is_admin(&cmd.actor),
        )?;

        // 2. Export
        let channel = self
            .platform
            .fetch_channel(cmd.channel_id)
            .await?
            .ok_or_else(|| TicketError::unexpected("ticket channel is unavailable"))?;
        let transcript = self
            .exporter
            .export(&channel)
            .await
            .map_err(|e| TicketError::unexpected(format!("transcript export: {}", e)))?;

        // 3. Deliver to the requester
        let summary = messages::transcript_summary(&ticket, &cmd.actor.tag, Timestamp::now());
        let notification =
            OutgoingMessage::embed(summary).with_attachment(transcript.to_attachment());
        let delivery = self
            .fanout
            .deliver(&[RecipientTarget::Direct(cmd.actor.id)], &notification)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| TicketError::unexpected("no delivery outcome"))?;

        if let Some(cause) = delivery.failure_cause() {
            return Err(TicketError::DeliveryFailed(cause.to_string()));
        }

        tracing::info!(
            channel_id = %cmd.channel_id,
            requested_by = %cmd.actor.id,
            messages = transcript.message_count,
            "Transcript printed"
        );

        Ok(PrintTicketResult {
            transcript: transcript.filename,
            message_count: transcript.message_count,
            delivery,
        })
    }
}
