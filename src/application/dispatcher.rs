//! Action dispatcher - routes inbound action events to the ticket handlers.
//!
//! Every event gets a reply. Handler errors are turned into user-facing
//! text here; unexpected ones are logged at error level first.

use std::sync::Arc;

use crate::config::{ServiceIdentity, TicketingConfig};
use crate::domain::ticket::{ActionEvent, ActionKind, ActionResponse, TicketError};
use crate::ports::{ChatPlatform, TicketStore, TranscriptExporter};

use super::handlers::ticket::{
    AddParticipantCommand, AddParticipantHandler, CloseTicketCommand, CloseTicketHandler,
    DeleteTicketCommand, DeleteTicketHandler, OpenTicketCommand, OpenTicketHandler,
    PrintTicketCommand, PrintTicketHandler, ReconcileTicketsHandler, SaveTicketCommand,
    SaveTicketHandler,
};
use super::messages;

/// Collaborators shared by every handler.
#[derive(Clone)]
pub struct TicketServices {
    pub store: Arc<dyn TicketStore>,
    pub platform: Arc<dyn ChatPlatform>,
    pub exporter: Arc<dyn TranscriptExporter>,
    pub config: Arc<TicketingConfig>,
    pub identity: ServiceIdentity,
}

impl TicketServices {
    pub fn reconciler(&self) -> ReconcileTicketsHandler {
        ReconcileTicketsHandler::new(self.store.clone(), self.platform.clone())
    }
}

/// Entry point for the platform layer.
pub struct ActionDispatcher {
    open: OpenTicketHandler,
    add_participant: AddParticipantHandler,
    close: CloseTicketHandler,
    save: SaveTicketHandler,
    delete: DeleteTicketHandler,
    print: PrintTicketHandler,
}

impl ActionDispatcher {
    pub fn new(services: TicketServices) -> Self {
        let TicketServices {
            store,
            platform,
            exporter,
            config,
            identity,
        } = services;

        Self {
            open: OpenTicketHandler::new(
                store.clone(),
                platform.clone(),
                config.clone(),
                identity,
            ),
            add_participant: AddParticipantHandler::new(
                store.clone(),
                platform.clone(),
                config.clone(),
            ),
            close: CloseTicketHandler::new(
                store.clone(),
                platform.clone(),
                exporter.clone(),
                config.clone(),
                identity,
            ),
            save: SaveTicketHandler::new(store.clone(), platform.clone(), config.clone()),
            delete: DeleteTicketHandler::new(store.clone(), platform.clone(), config.clone()),
            print: PrintTicketHandler::new(store, platform, exporter, config),
        }
    }

    /// Handle one event and produce the reply for the acting user.
    pub async fn dispatch(&self, event: ActionEvent) -> ActionResponse {
        let action = event.kind.name();
        let channel_id = event.channel_id;
        let actor_id = event.actor.id;

        tracing::debug!(
            action,
            channel_id = %channel_id,
            user_id = %actor_id,
            "Dispatching action"
        );

        match self.route(event).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_expected() {
                    tracing::info!(
                        action,
                        channel_id = %channel_id,
                        user_id = %actor_id,
                        reason = %err,
                        "Action refused"
                    );
                } else {
                    tracing::error!(
                        action,
                        channel_id = %channel_id,
                        user_id = %actor_id,
                        error = %err,
                        "Action failed"
                    );
                }
                ActionResponse::Message(err.user_message())
            }
        }
    }

    async fn route(&self, event: ActionEvent) -> Result<ActionResponse, TicketError> {
        let ActionEvent {
            actor,
            channel_id,
            source_message_id,
            kind,
        } = event;

        match kind {
            ActionKind::SelectTicketType { value } => {
                let result = self
                    .open
                    .handle(OpenTicketCommand {
                        actor,
                        ticket_type: value,
                    })
                    .await?;
                Ok(ActionResponse::message(format!(
                    "✅ Your ticket has been created: <#{}>",
                    result.channel.id
                )))
            }
            ActionKind::CloseTicket => {
                self.close
                    .handle(CloseTicketCommand { actor, channel_id })
                    .await?;
                Ok(ActionResponse::message("🔒 Ticket closed."))
            }
            ActionKind::DeleteTicket => {
                self.delete
                    .handle(DeleteTicketCommand { actor, channel_id })
                    .await?;
                Ok(ActionResponse::message("🗑️ Ticket deleted."))
            }
            ActionKind::SaveTicket => {
                self.save
                    .handle(SaveTicketCommand {
                        actor,
                        channel_id,
                        source_message_id,
                    })
                    .await?;
                Ok(ActionResponse::message("📂 Ticket saved."))
            }
            ActionKind::AddUser => {
                self.add_participant.authorize(&actor, channel_id).await?;
                Ok(ActionResponse::ShowAddParticipantForm)
            }
            ActionKind::PrintTicket => {
                self.print
                    .handle(PrintTicketCommand { actor, channel_id })
                    .await?;
                Ok(ActionResponse::message(
                    "📨 Transcript sent to your direct messages.",
                ))
            }
            ActionKind::AddParticipantSubmitted { target, reason } => {
                let result = self
                    .add_participant
                    .handle(AddParticipantCommand {
                        actor,
                        channel_id,
                        target,
                        reason,
                    })
                    .await?;
                let text = if result.newly_added {
                    format!("✅ {} has been added to the ticket.", messages::mention(result.user_id))
                } else {
                    format!("ℹ️ {} is already in this ticket.", messages::mention(result.user_id))
                };
                Ok(ActionResponse::Message(text))
            }
        }
    }
}
