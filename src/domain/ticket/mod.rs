//! Ticket domain module.
//!
//! A ticket is a private channel opened by one user, optionally shared with
//! participants added later, closed once and then either saved or deleted.
//!
//! - `Ticket` - the persisted record
//! - `TicketStatus` - lifecycle state machine
//! - `TicketType` - configured categories
//! - `TicketPolicy` - pure admission and authorization rules
//! - `ActionEvent` - inbound user actions

mod action;
mod aggregate;
mod errors;
mod policy;
mod status;
mod ticket_type;

pub use action::{custom_id, ActionEvent, ActionKind, ActionResponse, Actor};
pub use aggregate::{decode_participants, encode_participants, Ticket};
pub use errors::TicketError;
pub use policy::{ExistingTicket, OpenDecision, PolicyDenial, TicketAction, TicketPolicy};
pub use status::TicketStatus;
pub use ticket_type::{find_by_slug, TicketType};
