//! DeleteTicketHandler - Command handler for removing a closed ticket's channel.
//!
//! The store record is kept. Startup reconciliation purges records whose
//! channel is gone. Saved tickets are terminal and stay.

use std::sync::Arc;

use crate::config::TicketingConfig;
use crate::domain::foundation::{ChannelId, StateMachine};
use crate::domain::ticket::{Actor, TicketAction, TicketError, TicketPolicy, TicketStatus};
use crate::ports::{ChatPlatform, TicketStore};

use super::{load_ticket, observed_status};

/// Command to delete a closed ticket's channel.
#[derive(Debug, Clone)]
pub struct DeleteTicketCommand {
    pub actor: Actor,
    pub channel_id: ChannelId,
}

/// Handler for deleting tickets.
pub struct DeleteTicketHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
    config: Arc<TicketingConfig>,
    policy: TicketPolicy,
}

impl DeleteTicketHandler {
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

    pub async fn handle(&self, cmd: DeleteTicketCommand) -> Result<(), TicketError> {
        let ticket = load_ticket(self.store.as_ref(), cmd.channel_id).await?;
        ticket
            .status()
            .transition_to(TicketStatus::Deleted)
            .map_err(|_| TicketError::invalid_state("Close the ticket before deleting it."))?;
        self.policy.can_act(
            cmd.actor.id,
            &ticket,
            TicketAction::Delete,
            self.config.is_admin(&cmd.actor),
        )?;

        let channel = self
            .platform
            .fetch_channel(cmd.channel_id)
            .await?
            .ok_or_else(|| TicketError::unexpected("ticket channel is unavailable"))?;
        observed_status(&ticket, &channel)
            .transition_to(TicketStatus::Deleted)
            .map_err(|_| TicketError::invalid_state("A saved ticket cannot be deleted."))?;

        self.platform.delete_channel(cmd.channel_id).await?;

        tracing::info!(
            channel_id = %cmd.channel_id,
            owner_id = %ticket.owner_id(),
            deleted_by = %cmd.actor.id,
            "Ticket channel deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTicketStore;
    use crate::adapters::platform::MockChatPlatform;
    use crate::application::handlers::ticket::test_support::*;
    use crate::domain::ticket::PolicyDenial;
    use crate::ports::PlatformError;

    fn handler(store: &InMemoryTicketStore, platform: &MockChatPlatform) -> DeleteTicketHandler {
        DeleteTicketHandler::new(Arc::new(store.clone()), Arc::new(platform.clone()), config())
    }

    fn command(actor: Actor, channel_id: ChannelId) -> DeleteTicketCommand {
        DeleteTicketCommand { actor, channel_id }
    }

    #[tokio::test]
    async fn admin_deletes_channel_and_record_remains() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;

        handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id()))
            .await
            .unwrap();

        assert!(platform.channel(ticket.channel_id()).is_none());
        let record = store.get(ticket.channel_id()).await.unwrap().unwrap();
        assert!(record.is_closed());
    }

    #[tokio::test]
    async fn owner_cannot_delete() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;

        let err = handler(&store, &platform)
            .handle(command(owner(), ticket.channel_id()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TicketError::PolicyDenied(PolicyDenial::InsufficientRole {
                action: TicketAction::Delete
            })
        );
        assert!(platform.channel(ticket.channel_id()).is_some());
    }

    #[tokio::test]
    async fn open_ticket_cannot_be_deleted() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = open_ticket(&store, &platform).await;

        let err = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TicketError::invalid_state("Close the ticket before deleting it.")
        );
        assert!(!platform.was_called("delete_channel"));
    }

    #[tokio::test]
    async fn saved_ticket_cannot_be_deleted() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;
        platform
            .rename_channel(ticket.channel_id(), "ticket-bob 🔒 📂")
            .await
            .unwrap();

        let err = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id()))
            .await
            .unwrap_err();

        assert_eq!(err, TicketError::invalid_state("A saved ticket cannot be deleted."));
        assert!(platform.channel(ticket.channel_id()).is_some());
        assert!(!platform.was_called("delete_channel"));
    }

    #[tokio::test]
    async fn vanished_channel_is_unexpected() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;
        platform.remove_channel(ticket.channel_id());

        let err = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id()))
            .await
            .unwrap_err();

        assert!(!err.is_expected());
    }

    #[tokio::test]
    async fn platform_failure_is_unexpected() {
        let store = InMemoryTicketStore::new();
        let platform = platform();
        let ticket = closed_ticket(&store, &platform).await;
        platform.fail_method("delete_channel", PlatformError::Forbidden("missing".into()));

        let err = handler(&store, &platform)
            .handle(command(moderator(), ticket.channel_id()))
            .await
            .unwrap_err();

        assert!(!err.is_expected());
    }
}
