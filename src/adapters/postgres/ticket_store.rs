//! PostgreSQL implementation of TicketStore.
//!
//! Schema (see `migrations/`):
//!
//! | column | type | notes |
//! |--------|------|-------|
//! | channel_id | TEXT PK | snowflake |
//! | user_id | TEXT | owner snowflake |
//! | added_users | TEXT | comma-delimited participant snowflakes |
//! | closed | BOOLEAN | defaults to false |
//!
//! The partial unique index `tickets_one_open_per_owner` turns `insert` into
//! an atomic claim of the owner's single open slot.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ChannelId, DomainError, ErrorCode, UserId};
use crate::domain::ticket::{decode_participants, encode_participants, Ticket};
use crate::ports::TicketStore;

const OPEN_OWNER_INDEX: &str = "tickets_one_open_per_owner";

/// PostgreSQL implementation of TicketStore.
#[derive(Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn get(&self, channel_id: ChannelId) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT channel_id, user_id, COALESCE(added_users, '') AS added_users, closed
            FROM tickets
            WHERE channel_id = $1
            "#,
        )
        .bind(channel_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch ticket", e))?;

        row.map(row_to_ticket).transpose()
    }

    async fn get_open_by_owner(&self, owner_id: UserId) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT channel_id, user_id, COALESCE(added_users, '') AS added_users, closed
            FROM tickets
            WHERE user_id = $1 AND NOT closed
            LIMIT 1
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch open ticket", e))?;

        row.map(row_to_ticket).transpose()
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tickets (channel_id, user_id, added_users, closed)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(ticket.channel_id().to_string())
        .bind(ticket.owner_id().to_string())
        .bind(encode_participants(ticket.participants()))
        .bind(ticket.is_closed())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(ticket, e))?;

        Ok(())
    }

    async fn set_closed(&self, channel_id: ChannelId) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE tickets SET closed = TRUE WHERE channel_id = $1")
            .bind(channel_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to close ticket", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(channel_id));
        }
        Ok(())
    }

    async fn add_participant(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE tickets SET added_users = CASE
                WHEN trim(COALESCE(added_users, '')) = '' THEN $2
                ELSE added_users || ',' || $2
            END
            WHERE channel_id = $1
              AND NOT EXISTS (
                  SELECT 1
                  FROM unnest(string_to_array(COALESCE(added_users, ''), ',')) AS entry
                  WHERE trim(entry) = $2
              )
            "#,
        )
        .bind(channel_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to add participant", e))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Nothing updated: either already a participant or no such ticket.
        match self.get(channel_id).await? {
            Some(_) => Ok(false),
            None => Err(not_found(channel_id)),
        }
    }

    async fn delete(&self, channel_id: ChannelId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM tickets WHERE channel_id = $1")
            .bind(channel_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete ticket", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn all(&self) -> Result<Vec<Ticket>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT channel_id, user_id, COALESCE(added_users, '') AS added_users, closed
            FROM tickets
            ORDER BY channel_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list tickets", e))?;

        rows.into_iter().map(row_to_ticket).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn not_found(channel_id: ChannelId) -> DomainError {
    DomainError::new(
        ErrorCode::TicketNotFound,
        format!("Ticket not found: {}", channel_id),
    )
}

fn insert_error(ticket: &Ticket, err: sqlx::Error) -> DomainError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return if db_err.constraint() == Some(OPEN_OWNER_INDEX) {
                DomainError::new(
                    ErrorCode::TicketAlreadyOpen,
                    format!("User {} already has an open ticket", ticket.owner_id()),
                )
                .with_detail("owner_id", ticket.owner_id().to_string())
            } else {
                DomainError::new(
                    ErrorCode::DuplicateTicket,
                    format!("Channel {} already has a ticket", ticket.channel_id()),
                )
            };
        }
    }
    DomainError::database("Failed to insert ticket", err)
}

fn row_to_ticket(row: PgRow) -> Result<Ticket, DomainError> {
    let channel_id: String = row
        .try_get("channel_id")
        .map_err(|e| DomainError::database("Failed to read channel_id", e))?;
    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| DomainError::database("Failed to read user_id", e))?;
    let added_users: String = row
        .try_get("added_users")
        .map_err(|e| DomainError::database("Failed to read added_users", e))?;
    let closed: bool = row
        .try_get("closed")
        .map_err(|e| DomainError::database("Failed to read closed", e))?;

    let channel_id = channel_id
        .parse::<ChannelId>()
        .map_err(|e| DomainError::database("Corrupt channel_id", e))?;
    let owner_id = user_id
        .parse::<UserId>()
        .map_err(|e| DomainError::database("Corrupt user_id", e))?;

    Ok(Ticket::reconstitute(
        channel_id,
        owner_id,
        decode_participants(&added_users),
        closed,
    ))
}
