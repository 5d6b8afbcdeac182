//! AddParticipantHandler - Command handler for sharing a ticket with another member.

use std::sync::Arc;

use crate::config::TicketingConfig;
use crate::domain::foundation::{ChannelId, StateMachine, UserId};
use crate::domain::ticket::{Actor, Ticket, TicketAction, TicketError, TicketPolicy, TicketStatus};
use crate::ports::{ChatPlatform, OverwriteTarget, Permission, PermissionOverwrite, TicketStore};

use super::load_ticket;
use crate::application::messages;

/// Command to add a member to a ticket.
#[derive(Debug, Clone)]
pub struct AddParticipantCommand {
    pub actor: Actor,
    pub channel_id: ChannelId,
    /// Raw user id as typed into the form.
    pub target: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AddParticipantResult {
    pub user_id: UserId,
    /// False when the member was already a participant.
    pub newly_added: bool,
}

/// Handler for adding participants.
pub struct AddParticipantHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
    config: Arc<TicketingConfig>,
    policy: TicketPolicy,
}

impl AddParticipantHandler {
    pub fn new(
        store: Arc<dyn TicketStore>,
        platform: Arc<dyn ChatPlatform>,
        config: Arc<TicketingConfig>,
    ) -> Self {
        Self {
            store,
            platform,
            config,
            policy: TicketPolicy,
        }
    }

    /// Checks shared by the form request and the form submission.
    pub async fn authorize(
        &self,
        actor: &Actor,
        channel_id: ChannelId,
    ) -> Result<Ticket, TicketError> {
        let ticket = load_ticket(self.store.as_ref(), channel_id).await?;

        ticket
            .status()
            .transition_to(TicketStatus::Open)
            .map_err(|_| TicketError::invalid_state("This ticket is closed."))?;

        self.policy.can_act(
            actor.id,
            &ticket,
            TicketAction::AddParticipant,
            self.config.is_admin(actor),
        )?;

        Ok(ticket)
    }

    pub async fn handle(
        &self,
        cmd: AddParticipantCommand,
    ) -> Result<AddParticipantResult, TicketError> {
        // 1. Load and authorize
        self.authorize(&cmd.actor, cmd.channel_id).await?;

        // 2. Resolve the target member
        let user_id: UserId = cmd
            .target
            .parse()
            .map_err(|_| TicketError::MemberNotFound(cmd.target.clone()))?;
        let member = self
            .platform
            .fetch_member(user_id)
            .await?
            .ok_or_else(|| TicketError::MemberNotFound(cmd.target.clone()))?;

        // 3. Grant access
        self.platform
            .edit_permissions(
                cmd.channel_id,
                &PermissionOverwrite::allow(
                    OverwriteTarget::Member(member.user_id),
                    vec![Permission::ViewChannel, Permission::SendMessages],
                ),
            )
            .await?;

        // 4. Record
        let newly_added = self
            .store
            .add_participant(cmd.channel_id, member.user_id)
            .await?;

        // 5. Announce
        if let Err(e) = self
            .platform
            .send_message(
                cmd.channel_id,
                &messages::participant_added(member.user_id, &cmd.reason),
            )
            .await
        {
            tracing::warn!(
                channel_id = %cmd.channel_id,
                error = %e,
                "Failed to announce new participant"
            );
        }

        tracing::info!(
            channel_id = %cmd.channel_id,
            user_id = %member.user_id,
            added_by = %cmd.actor.id,
            newly_added,
            "Participant added"
        );

        Ok(AddParticipantResult {
            user_id: member.user_id,
            newly_added,
        })
    }
}
