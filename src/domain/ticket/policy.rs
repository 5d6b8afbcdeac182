//! Ticket policy - pure authorization and admission rules.
//!
//! No I/O happens here. Callers gather the facts (the owner's open ticket,
//! whether its channel is still reachable, whether the actor holds the
//! admin role) and the policy turns them into a decision.

use std::fmt;

use crate::domain::foundation::{ChannelId, UserId};

use super::Ticket;

/// Actions that require authorization against an existing ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketAction {
    Close,
    AddParticipant,
    Save,
    Delete,
    Print,
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketAction::Close => "close",
            TicketAction::AddParticipant => "add a participant to",
            TicketAction::Save => "save",
            TicketAction::Delete => "delete",
            TicketAction::Print => "print",
        };
        write!(f, "{}", s)
    }
}

/// Why the policy refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDenial {
    /// The owner already has an open ticket whose channel is reachable.
    AlreadyOpen { channel_id: ChannelId },
    /// The actor lacks the role or ownership the action requires.
    InsufficientRole { action: TicketAction },
}

impl PolicyDenial {
    pub fn user_message(&self) -> String {
        match self {
            PolicyDenial::AlreadyOpen { channel_id } => {
                format!("⚠️ You already have an open ticket: <#{}>", channel_id)
            }
            PolicyDenial::InsufficientRole { action } => {
                format!("⚠️ You do not have permission to {} this ticket.", action)
            }
        }
    }
}

impl fmt::Display for PolicyDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Outcome of the admission check for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenDecision {
    Allow,
    Deny(PolicyDenial),
    /// The owner's open ticket points at a channel that is gone. Mark it
    /// closed, then proceed as if allowed.
    Reclaim(ChannelId),
}

/// The owner's current open ticket, together with whether its channel can
/// still be reached.
#[derive(Debug, Clone, Copy)]
pub struct ExistingTicket<'a> {
    pub ticket: &'a Ticket,
    pub channel_reachable: bool,
}

/// Stateless rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketPolicy;

impl TicketPolicy {
    /// May `owner_id` open a new ticket now?
    pub fn can_open(&self, owner_id: UserId, existing: Option<ExistingTicket<'_>>) -> OpenDecision {
        let Some(existing) = existing else {
            return OpenDecision::Allow;
        };
        let ticket = existing.ticket;
        if ticket.is_closed() || !ticket.is_owner(owner_id) {
            return OpenDecision::Allow;
        }
        if existing.channel_reachable {
            OpenDecision::Deny(PolicyDenial::AlreadyOpen {
                channel_id: ticket.channel_id(),
            })
        } else {
            OpenDecision::Reclaim(ticket.channel_id())
        }
    }

    /// May `actor_id` perform `action` on `ticket`?
    ///
    /// - close, add participant: admin or owner
    /// - save, delete: admin only
    /// - print: admin, owner or participant
    pub fn can_act(
        &self,
        actor_id: UserId,
        ticket: &Ticket,
        action: TicketAction,
        admin_role_held: bool,
    ) -> Result<(), PolicyDenial> {
        if admin_role_held {
            return Ok(());
        }
        let allowed = match action {
            TicketAction::Close | TicketAction::AddParticipant => ticket.is_owner(actor_id),
            TicketAction::Save | TicketAction::Delete => false,
            TicketAction::Print => ticket.is_owner(actor_id) || ticket.is_participant(actor_id),
        };
        if allowed {
            Ok(())
        } else {
            Err(PolicyDenial::InsufficientRole { action })
        }
    }
}
