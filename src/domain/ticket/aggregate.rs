//! Ticket aggregate entity.
//!
//! A ticket is bound to exactly one private channel. The channel id is the
//! primary key; the record tracks who opened it, who was added afterwards,
//! and whether it has been closed.

use crate::domain::foundation::{ChannelId, UserId};
use serde::{Deserialize, Serialize};

use super::TicketStatus;

/// Ticket aggregate.
///
/// # Invariants
///
/// - `owner_id` never changes after creation
/// - `participants` contains no duplicates
/// - `closed` is monotonic: once true it never reverts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    channel_id: ChannelId,
    owner_id: UserId,
    participants: Vec<UserId>,
    closed: bool,
}

impl Ticket {
    /// Create a new open ticket with no participants.
    pub fn open(channel_id: ChannelId, owner_id: UserId) -> Self {
        Self {
            channel_id,
            owner_id,
            participants: Vec::new(),
            closed: false,
        }
    }

    /// Reconstitute a ticket from persistence.
    ///
    /// Duplicate participant ids are collapsed, keeping first occurrence.
    pub fn reconstitute(
        channel_id: ChannelId,
        owner_id: UserId,
        participants: Vec<UserId>,
        closed: bool,
    ) -> Self {
        let mut ticket = Self {
            channel_id,
            owner_id,
            participants: Vec::with_capacity(participants.len()),
            closed,
        };
        for participant in participants {
            ticket.add_participant(participant);
        }
        ticket
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Persisted lifecycle state. Transient states (closing, saved, deleted)
    /// are never stored.
    pub fn status(&self) -> TicketStatus {
        if self.closed {
            TicketStatus::Closed
        } else {
            TicketStatus::Open
        }
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    /// Owner followed by every participant, without duplicates.
    pub fn members(&self) -> Vec<UserId> {
        let mut members = vec![self.owner_id];
        members.extend(
            self.participants
                .iter()
                .copied()
                .filter(|id| *id != self.owner_id),
        );
        members
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a participant. Returns false when the id was already present.
    pub fn add_participant(&mut self, user_id: UserId) -> bool {
        if self.participants.contains(&user_id) {
            return false;
        }
        self.participants.push(user_id);
        true
    }

    /// Mark the ticket closed. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

/// Encode participants as the comma-delimited list used by the `added_users`
/// column.
pub fn encode_participants(participants: &[UserId]) -> String {
    participants
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode the comma-delimited `added_users` column.
///
/// Blank entries are skipped; entries that are not snowflakes are dropped
/// rather than failing the whole row.
pub fn decode_participants(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<UserId>().ok())
        .collect()
}
