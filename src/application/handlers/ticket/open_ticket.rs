//! OpenTicketHandler - Command handler for opening a ticket.

use std::sync::Arc;

use crate::config::{ServiceIdentity, TicketingConfig};
use crate::domain::foundation::{ChannelId, DomainError, ErrorCode};
use crate::domain::ticket::{
    Actor, ExistingTicket, OpenDecision, PolicyDenial, Ticket, TicketError, TicketPolicy,
    TicketType,
};
use crate::ports::{
    Channel, ChannelSpec, ChatPlatform, OverwriteTarget, Permission, PermissionOverwrite,
    PlatformError, TicketStore,
};

use crate::application::messages;

/// Command to open a ticket of a configured type.
#[derive(Debug, Clone)]
pub struct OpenTicketCommand {
    pub actor: Actor,
    /// Menu value (type slug) the user selected.
    pub ticket_type: String,
}

/// Result of a successful open.
#[derive(Debug, Clone)]
pub struct OpenTicketResult {
    pub ticket: Ticket,
    pub channel: Channel,
    /// Stale open ticket that was closed to make room, if any.
    pub reclaimed: Option<ChannelId>,
    pub control_message_posted: bool,
}

/// Handler for opening tickets.
pub struct OpenTicketHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
    config: Arc<TicketingConfig>,
    identity: ServiceIdentity,
    policy: TicketPolicy,
}

impl OpenTicketHandler {
    pub fn new(
        store: Arc<dyn TicketStore>,
        platform: Arc<dyn ChatPlatform>,
        config: Arc<TicketingConfig>,
        identity: ServiceIdentity,
    ) -> Self {
        Self {
            store,
            platform,
            config,
            identity,
            policy: TicketPolicy,
        }
    }

    pub async fn handle(&self, cmd: OpenTicketCommand) -> Result<OpenTicketResult, TicketError> {
        // 1. Resolve the ticket type
        let ticket_type = self
            .config
            .find_type(&cmd.ticket_type)
            .ok_or_else(|| TicketError::UnknownTicketType(cmd.ticket_type.clone()))?;

        // 2. Admission
        let reclaimed = self.admit(&cmd.actor).await?;

        // 3. Provision the channel
        let spec = ChannelSpec {
            name: messages::channel_name_for(&cmd.actor.tag),
            parent: ticket_type.category_id,
            overwrites: self.overwrites(&cmd.actor, ticket_type),
        };
        let channel = self
            .platform
            .create_channel(&spec)
            .await
            .map_err(|e| provisioning_error(ticket_type, e))?;

        // 4. Claim the owner's open slot
        let ticket = Ticket::open(channel.id, cmd.actor.id);
        if let Err(e) = self.store.insert(&ticket).await {
            self.discard_channel(channel.id).await;
            return Err(self.claim_error(&cmd.actor, e).await);
        }

        // 5. Control message
        let control_message_posted = match self
            .platform
            .send_message(channel.id, &messages::control_message(cmd.actor.id, ticket_type))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    channel_id = %channel.id,
                    error = %e,
                    "Failed to post ticket control message"
                );
                false
            }
        };

        tracing::info!(
            channel_id = %channel.id,
            owner_id = %cmd.actor.id,
            ticket_type = %ticket_type.name,
            "Ticket opened"
        );

        Ok(OpenTicketResult {
            ticket,
            channel,
            reclaimed,
            control_message_posted,
        })
    }

    /// Apply the open policy; closes a stale record when its channel is gone.
    async fn admit(&self, actor: &Actor) -> Result<Option<ChannelId>, TicketError> {
        let existing = self.store.get_open_by_owner(actor.id).await?;

        let reachable = match &existing {
            Some(ticket) => self
                .platform
                .fetch_channel(ticket.channel_id())
                .await?
                .is_some_and(|c| c.viewable),
            None => false,
        };

        let decision = self.policy.can_open(
            actor.id,
            existing.as_ref().map(|ticket| ExistingTicket {
                ticket,
                channel_reachable: reachable,
            }),
        );

        match decision {
            OpenDecision::Allow => Ok(None),
            OpenDecision::Deny(denial) => Err(denial.into()),
            OpenDecision::Reclaim(stale) => {
                self.store.set_closed(stale).await?;
                tracing::info!(
                    channel_id = %stale,
                    owner_id = %actor.id,
                    "Reclaimed open ticket whose channel is gone"
                );
                Ok(Some(stale))
            }
        }
    }

    fn overwrites(&self, actor: &Actor, ticket_type: &TicketType) -> Vec<PermissionOverwrite> {
        let member_access = vec![Permission::ViewChannel, Permission::SendMessages];

        let mut overwrites = vec![
            PermissionOverwrite::deny(
                OverwriteTarget::Role(self.identity.guild_id.everyone_role()),
                vec![Permission::ViewChannel],
            ),
            PermissionOverwrite::allow(OverwriteTarget::Member(actor.id), member_access.clone()),
            PermissionOverwrite::allow(
                OverwriteTarget::Member(self.identity.user_id),
                vec![
                    Permission::ViewChannel,
                    Permission::SendMessages,
                    Permission::ManageChannels,
                ],
            ),
        ];
        for role in [ticket_type.role_id, self.config.admin_role_id]
            .into_iter()
            .flatten()
        {
            overwrites.push(PermissionOverwrite::allow(
                OverwriteTarget::Role(role),
                member_access.clone(),
            ));
        }
        overwrites
    }

    /// Remove a channel whose ticket record could not be written.
    async fn discard_channel(&self, channel_id: ChannelId) {
        if let Err(e) = self.platform.delete_channel(channel_id).await {
            tracing::error!(
                channel_id = %channel_id,
                error = %e,
                "Failed to delete channel after lost ticket claim"
            );
        }
    }

    async fn claim_error(&self, actor: &Actor, err: DomainError) -> TicketError {
        if err.code != ErrorCode::TicketAlreadyOpen {
            return err.into();
        }
        match self.store.get_open_by_owner(actor.id).await {
            Ok(Some(winner)) => PolicyDenial::AlreadyOpen {
                channel_id: winner.channel_id(),
            }
            .into(),
            Ok(None) => TicketError::unexpected("open ticket claim lost to a record that vanished"),
            Err(e) => e.into(),
        }
    }
}

fn provisioning_error(ticket_type: &TicketType, err: PlatformError) -> TicketError {
    let hint = match &err {
        PlatformError::InvalidParent(_) => format!(
            "The category configured for \"{}\" ({}) does not exist or is not a category. \
             Please ask an administrator to fix the ticket configuration.",
            ticket_type.name, ticket_type.category_id
        ),
        _ => "Please try again later.".to_string(),
    };
    tracing::error!(
        ticket_type = %ticket_type.name,
        category_id = %ticket_type.category_id,
        error = %err,
        "Failed to create ticket channel"
    );
    TicketError::ProvisioningFailed {
        reason: err.to_string(),
        hint,
    }
}
