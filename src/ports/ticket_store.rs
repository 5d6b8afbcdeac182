//! Ticket store port.
//!
//! The store is the only source of truth for ticket lifecycle state. Every
//! operation is a single-record atomic read or write.

use async_trait::async_trait;

use crate::domain::foundation::{ChannelId, DomainError, UserId};
use crate::domain::ticket::Ticket;

/// Durable keyed record of tickets.
///
/// Implementations must ensure:
/// - `insert` is a conditional claim: it fails with `TicketAlreadyOpen`
///   when the owner already has an open ticket, and `DuplicateTicket` when
///   the channel id is taken, without writing anything
/// - `add_participant` is an atomic set-add
/// - a missing record is `Ok(None)` from `get`, never an error
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Find the ticket bound to a channel.
    async fn get(&self, channel_id: ChannelId) -> Result<Option<Ticket>, DomainError>;

    /// Find the owner's open ticket, if any.
    async fn get_open_by_owner(&self, owner_id: UserId) -> Result<Option<Ticket>, DomainError>;

    /// Insert a new ticket, claiming the owner's single open slot.
    ///
    /// # Errors
    ///
    /// - `TicketAlreadyOpen` if the owner has an open ticket
    /// - `DuplicateTicket` if the channel already has a record
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, ticket: &Ticket) -> Result<(), DomainError>;

    /// Mark a ticket closed. Closing a closed ticket succeeds.
    ///
    /// # Errors
    ///
    /// - `TicketNotFound` if no record exists
    async fn set_closed(&self, channel_id: ChannelId) -> Result<(), DomainError>;

    /// Add a participant. Returns false when already present.
    ///
    /// # Errors
    ///
    /// - `TicketNotFound` if no record exists
    async fn add_participant(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<bool, DomainError>;

    /// Remove a record. Returns false when there was nothing to remove.
    async fn delete(&self, channel_id: ChannelId) -> Result<bool, DomainError>;

    /// Every stored ticket, open and closed.
    async fn all(&self) -> Result<Vec<Ticket>, DomainError>;
}
