//! SaveTicketHandler - Command handler for archiving a closed ticket in place.

use std::sync::Arc;

use crate::config::TicketingConfig;
use crate::domain::foundation::{ChannelId, MessageId, StateMachine};
use crate::domain::ticket::{Actor, TicketAction, TicketError, TicketPolicy, TicketStatus};
use crate::ports::{Button, ChatPlatform, TicketStore};

use super::{load_ticket, observed_status};
use crate::application::messages;

/// Command to save a closed ticket.
#[derive(Debug, Clone)]
pub struct SaveTicketCommand {
    pub actor: Actor,
    pub channel_id: ChannelId,
    /// Summary message whose buttons get disabled.
    pub source_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicketResult {
    pub buttons_disabled: bool,
}

/// Handler for saving tickets.
pub struct SaveTicketHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
    config: Arc<TicketingConfig>,
    policy: TicketPolicy,
}

impl SaveTicketHandler {
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

    pub async fn handle(&self, cmd: SaveTicketCommand) -> Result<SaveTicketResult, TicketError> {
        // 1. Load, check state and authorize
        let ticket = load_ticket(self.store.as_ref(), cmd.channel_id).await?;
        ticket
            .status()
            .transition_to(TicketStatus::Saved)
            .map_err(|_| TicketError::invalid_state("Close the ticket before saving it."))?;
        self.policy.can_act(
            cmd.actor.id,
            &ticket,
            TicketAction::Save,
            self.config.is_admin(&cmd.actor),
        )?;

        // 2. Mark the channel; the marker is what makes the ticket saved
        let channel = self
            .platform
            .fetch_channel(cmd.channel_id)
            .await?
            .ok_or_else(|| TicketError::unexpected("ticket channel is unavailable"))?;
        observed_status(&ticket, &channel)
            .transition_to(TicketStatus::Saved)
            .map_err(|_| TicketError::invalid_state("This ticket has already been saved."))?;
        let name = format!("{}{}", channel.name, messages::SAVED_SUFFIX);
        self.platform.rename_channel(cmd.channel_id, &name).await?;

        // 3. Disable the admin buttons
        let buttons_disabled = match cmd.source_message_id {
            Some(message_id) => {
                let buttons: Vec<Button> = messages::closure_buttons()
                    .into_iter()
                    .map(Button::disabled)
                    .collect();
                match self
                    .platform
                    .edit_message_buttons(cmd.channel_id, message_id, &buttons)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            channel_id = %cmd.channel_id,
                            message_id = %message_id,
                            error = %e,
                            "Failed to disable summary buttons"
                        );
                        false
                    }
                }
            }
            None => false,
        };

        tracing::info!(
            channel_id = %cmd.channel_id,
            saved_by = %cmd.actor.id,
            "Ticket saved"
        );

        Ok(SaveTicketResult { buttons_disabled })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTicketStore;
    use crate::adapters::platform::MockChatPlatform;
    use crate::application::handlers::ticket::test_support::*;
    use crate::domain::ticket::PolicyDenial;
    use crate::ports::{OutgoingMessage, PlatformError};

    fn handler(store: &InMemoryTicketStore, platform: &MockChatPlatform) -> SaveTicketHandler {
        SaveTicketHandler::new(Arc::new(store.clone()), Arc::new(platform.clone()), config())
    }

    async fn post_summary(platform: &MockChatPlatform, channel_id: ChannelId) -> MessageId {
        platform
            .send_message(
                channel_id,
                &OutgoingMessage::text("closed").with_buttons(messages::closure_buttons()),
            )
            .await
            .unwrap()
            .id
    }

    fn command(
        actor: Actor,
        channel_id: ChannelId,
        source: Option<MessageId>,
    ) -> SaveTicketCommand {
        SaveTicketCommand {
            actor,
            channel_id,
            source_message_id: source,
        }
    }

    #[tokio::test]
    async fn admin_saves_closed_ticket() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;
        let summary = post_summary(&platform, ticket.channel_id()).await;

        let result = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id(), Some(summary)))
            .await
            .unwrap();

        assert_eq!(
            result,
            SaveTicketResult {
                buttons_disabled: true
            }
        );
        assert_eq!(
            platform.channel(ticket.channel_id()).unwrap().name,
            "ticket-bob 🔒 📂"
        );
        let message = platform.messages(ticket.channel_id()).pop().unwrap();
        assert_eq!(message.buttons.len(), 2);
        assert!(message.buttons.iter().all(|b| b.disabled));
        assert!(store.get(ticket.channel_id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn saved_ticket_cannot_be_saved_again() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;
        let handler = handler(&store, &platform);

        handler
            .handle(command(moderator(), ticket.channel_id(), None))
            .await
            .unwrap();
        let err = handler
            .handle(command(moderator(), ticket.channel_id(), None))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TicketError::invalid_state("This ticket has already been saved.")
        );
        assert_eq!(
            platform.channel(ticket.channel_id()).unwrap().name,
            "ticket-bob 🔒 📂"
        );
    }

    #[tokio::test]
    async fn owner_cannot_save() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;

        let err = handler(&store, &platform)
            .handle(command(owner(), ticket.channel_id(), None))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TicketError::PolicyDenied(PolicyDenial::InsufficientRole {
                action: TicketAction::Save
            })
        );
        assert!(!platform.was_called("rename_channel"));
    }

    #[tokio::test]
    async fn open_ticket_cannot_be_saved() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = open_ticket(&store, &platform).await;

        let err = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id(), None))
            .await
            .unwrap_err();

        assert!(matches!(err, TicketError::InvalidState(_)));
    }

    #[tokio::test]
    async fn button_edit_failure_is_tolerated() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;
        let summary = post_summary(&platform, ticket.channel_id()).await;
        platform.fail_method(
            "edit_message_buttons",
            PlatformError::NotFound("message".into()),
        );

        let result = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id(), Some(summary)))
            .await
            .unwrap();

        assert!(!result.buttons_disabled);
        assert_eq!(
            platform.channel(ticket.channel_id()).unwrap().name,
            "ticket-bob 🔒 📂"
        );
    }
}
