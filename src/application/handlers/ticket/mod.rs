//! Ticket lifecycle handlers.
//!
//! One handler per transition:
//! - `OpenTicketHandler` - admission, channel provisioning, atomic claim
//! - `AddParticipantHandler` - share an open ticket with another member
//! - `CloseTicketHandler` - grace period, revoke, archive, notify
//! - `SaveTicketHandler` / `DeleteTicketHandler` - admin follow-up on a closed ticket
//! - `PrintTicketHandler` - transcript on demand
//! - `ReconcileTicketsHandler` - startup cleanup of orphaned records

mod add_participant;
mod close_ticket;
mod delete_ticket;
mod open_ticket;
mod print_ticket;
mod reconcile_tickets;
mod save_ticket;

pub use add_participant::{AddParticipantCommand, AddParticipantHandler, AddParticipantResult};
pub use close_ticket::{
    CloseStep, CloseTicketCommand, CloseTicketHandler, CloseTicketResult, CLOSE_GRACE_PERIOD,
};
pub use delete_ticket::{DeleteTicketCommand, DeleteTicketHandler};
pub use open_ticket::{OpenTicketCommand, OpenTicketHandler, OpenTicketResult};
pub use print_ticket::{PrintTicketCommand, PrintTicketHandler, PrintTicketResult};
pub use reconcile_tickets::{ReconcileReport, ReconcileTicketsHandler};
pub use save_ticket::{SaveTicketCommand, SaveTicketHandler, SaveTicketResult};

use crate::application::messages;
use crate::domain::foundation::ChannelId;
use crate::domain::ticket::{Ticket, TicketError, TicketStatus};
use crate::ports::{Channel, TicketStore};

/// Load the ticket bound to `channel_id`.
pub(crate) async fn load_ticket(
    store: &dyn TicketStore,
    channel_id: ChannelId,
) -> Result<Ticket, TicketError> {
    store
        .get(channel_id)
        .await?
        .ok_or(TicketError::NotATicket(channel_id))
}

/// Status as seen through the ticket's channel: a closed ticket whose
/// channel carries the saved marker is `Saved`.
pub(crate) fn observed_status(ticket: &Ticket, channel: &Channel) -> TicketStatus {
    match ticket.status() {
        TicketStatus::Closed if channel.name.ends_with(messages::SAVED_SUFFIX) => {
            TicketStatus::Saved
        }
        status => status,
    }
}
