//! In-Memory Ticket Store Adapter
//!
//! Keeps tickets in a map guarded by one async lock. The open-ticket claim
//! and the insert happen under the same write guard, so two concurrent
//! opens for one owner cannot both succeed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, DomainError, ErrorCode, UserId};
use crate::domain::ticket::Ticket;
use crate::ports::TicketStore;

/// In-memory ticket store
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketStore {
    tickets: Arc<RwLock<HashMap<ChannelId, Ticket>>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with tickets (useful for tests).
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let map = tickets
            .into_iter()
            .map(|t| (t.channel_id(), t))
            .collect::<HashMap<_, _>>();
        Self {
            tickets: Arc::new(RwLock::new(map)),
        }
    }

    /// Number of stored tickets.
    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

fn not_found(channel_id: ChannelId) -> DomainError {
    DomainError::new(
        ErrorCode::TicketNotFound,
        format!("Ticket not found: {}", channel_id),
    )
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get(&self, channel_id: ChannelId) -> Result<Option<Ticket>, DomainError> {
        Ok(self.tickets.read().await.get(&channel_id).cloned())
    }

    async fn get_open_by_owner(&self, owner_id: UserId) -> Result<Option<Ticket>, DomainError> {
        Ok(self
            .tickets
            .read()
            .await
            .values()
            .find(|t| t.is_owner(owner_id) && !t.is_closed())
            .cloned())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let mut tickets = self.tickets.write().await;
        if tickets.contains_key(&ticket.channel_id()) {
            return Err(DomainError::new(
                ErrorCode::DuplicateTicket,
                format!("Channel {} already has a ticket", ticket.channel_id()),
            ));
        }
        if !ticket.is_closed()
            && tickets
                .values()
                .any(|t| t.is_owner(ticket.owner_id()) && !t.is_closed())
        {
            return Err(DomainError::new(
                ErrorCode::TicketAlreadyOpen,
                format!("User {} already has an open ticket", ticket.owner_id()),
            )
            .with_detail("owner_id", ticket.owner_id().to_string()));
        }
        tickets.insert(ticket.channel_id(), ticket.clone());
        Ok(())
    }

    async fn set_closed(&self, channel_id: ChannelId) -> Result<(), DomainError> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        ticket.close();
        Ok(())
    }

    async fn add_participant(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<bool, DomainError> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        Ok(ticket.add_participant(user_id))
    }

    async fn delete(&self, channel_id: ChannelId) -> Result<bool, DomainError> {
        Ok(self.tickets.write().await.remove(&channel_id).is_some())
    }

    async fn all(&self) -> Result<Vec<Ticket>, DomainError> {
        let mut tickets: Vec<Ticket> = self.tickets.read().await.values().cloned().collect();
        tickets.sort_by_key(|t| t.channel_id());
        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: UserId = UserId::new(1);

    fn ticket(channel: u64) -> Ticket {
        Ticket::open(ChannelId::new(channel), OWNER)
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = InMemoryTicketStore::new();
        store.insert(&ticket(10)).await.unwrap();

        let found = store.get(ChannelId::new(10)).await.unwrap().unwrap();
        assert_eq!(found.owner_id(), OWNER);
        assert!(store.get(ChannelId::new(11)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_open_ticket_for_owner_is_rejected() {
        let store = InMemoryTicketStore::new();
        store.insert(&ticket(10)).await.unwrap();

        let err = store.insert(&ticket(11)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TicketAlreadyOpen);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn closed_ticket_frees_the_owner_slot() {
        let store = InMemoryTicketStore::new();
        store.insert(&ticket(10)).await.unwrap();
        store.set_closed(ChannelId::new(10)).await.unwrap();

        store.insert(&ticket(11)).await.unwrap();
        let open = store.get_open_by_owner(OWNER).await.unwrap().unwrap();
        assert_eq!(open.channel_id(), ChannelId::new(11));
    }

    #[tokio::test]
    async fn duplicate_channel_is_rejected() {
        let store = InMemoryTicketStore::new();
        store.insert(&ticket(10)).await.unwrap();
        store.set_closed(ChannelId::new(10)).await.unwrap();

        let err = store.insert(&ticket(10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateTicket);
    }

    #[tokio::test]
    async fn concurrent_inserts_for_one_owner_yield_one_open_ticket() {
        let store = InMemoryTicketStore::new();
        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.insert(&ticket(10)).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.insert(&ticket(11)).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn add_participant_is_a_set_add() {
        let store = InMemoryTicketStore::new();
        store.insert(&ticket(10)).await.unwrap();

        assert!(store
            .add_participant(ChannelId::new(10), UserId::new(2))
            .await
            .unwrap());
        assert!(!store
            .add_participant(ChannelId::new(10), UserId::new(2))
            .await
            .unwrap());

        let t = store.get(ChannelId::new(10)).await.unwrap().unwrap();
        assert_eq!(t.participants().len(), 1);
    }

    #[tokio::test]
    async fn mutations_on_missing_ticket_fail() {
        let store = InMemoryTicketStore::new();
        let err = store.set_closed(ChannelId::new(99)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TicketNotFound);
        let err = store
            .add_participant(ChannelId::new(99), UserId::new(2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TicketNotFound);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryTicketStore::with_tickets([ticket(10)]);
        assert!(store.delete(ChannelId::new(10)).await.unwrap());
        assert!(!store.delete(ChannelId::new(10)).await.unwrap());
        assert!(store.is_empty().await);
    }
}
