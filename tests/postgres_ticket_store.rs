//! Integration tests for PostgresTicketStore.
//!
//! Require a disposable database:
//!
//! ```text
//! TICKETDESK_TEST_DATABASE_URL=postgres://localhost/ticketdesk_test \
//!     cargo test --test postgres_ticket_store -- --ignored
//! ```
//!
//! Every test works on its own id range and removes its rows afterwards.
//! The schema upgrade test runs in a throwaway schema of its own.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};

use ticketdesk::adapters::postgres::{run_migrations, PostgresTicketStore};
use ticketdesk::domain::foundation::{ChannelId, ErrorCode, UserId};
use ticketdesk::domain::ticket::Ticket;
use ticketdesk::ports::TicketStore;

fn database_url() -> String {
    std::env::var("TICKETDESK_TEST_DATABASE_URL")
        .expect("TICKETDESK_TEST_DATABASE_URL must be set for ignored tests")
}

async fn store() -> (PostgresTicketStore, PgPool) {
    let pool = PgPool::connect(&database_url()).await.expect("connect");
    run_migrations(&pool).await.expect("migrate");
    (PostgresTicketStore::new(pool.clone()), pool)
}

/// Base id unlikely to collide with other runs.
fn base_id() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    (nanos % 1_000_000_000_000) * 1_000
}

async fn cleanup(store: &PostgresTicketStore, channels: &[ChannelId]) {
    for channel_id in channels {
        store.delete(*channel_id).await.unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn second_open_ticket_for_owner_is_refused() {
    let (store, _pool) = store().await;
    let base = base_id();
    let owner = UserId::new(base);
    let first = ChannelId::new(base + 1);
    let second = ChannelId::new(base + 2);

    store.insert(&Ticket::open(first, owner)).await.unwrap();
    let err = store.insert(&Ticket::open(second, owner)).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::TicketAlreadyOpen);
    assert!(store.get(second).await.unwrap().is_none());

    store.set_closed(first).await.unwrap();
    store.insert(&Ticket::open(second, owner)).await.unwrap();
    assert_eq!(
        store.get_open_by_owner(owner).await.unwrap().unwrap().channel_id(),
        second
    );

    cleanup(&store, &[first, second]).await;
}

#[tokio::test]
#[ignore]
async fn participants_round_trip_as_a_set() {
    let (store, _pool) = store().await;
    let base = base_id();
    let channel = ChannelId::new(base + 1);
    store
        .insert(&Ticket::open(channel, UserId::new(base)))
        .await
        .unwrap();

    assert!(store.add_participant(channel, UserId::new(base + 5)).await.unwrap());
    assert!(!store.add_participant(channel, UserId::new(base + 5)).await.unwrap());
    assert!(store.add_participant(channel, UserId::new(base + 6)).await.unwrap());

    let ticket = store.get(channel).await.unwrap().unwrap();
    assert_eq!(
        ticket.participants(),
        &[UserId::new(base + 5), UserId::new(base + 6)]
    );

    cleanup(&store, &[channel]).await;
}

#[tokio::test]
#[ignore]
async fn missing_records_are_reported() {
    let (store, _pool) = store().await;
    let channel = ChannelId::new(base_id() + 9);

    assert!(store.get(channel).await.unwrap().is_none());
    assert_eq!(
        store.set_closed(channel).await.unwrap_err().code,
        ErrorCode::TicketNotFound
    );
    assert_eq!(
        store
            .add_participant(channel, UserId::new(1))
            .await
            .unwrap_err()
            .code,
        ErrorCode::TicketNotFound
    );
    assert!(!store.delete(channel).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn rows_inserted_with_defaults_read_as_open() {
    let (store, pool) = store().await;
    let base = base_id();
    let channel = ChannelId::new(base + 1);

    sqlx::query("INSERT INTO tickets (channel_id, user_id) VALUES ($1, $2)")
        .bind(channel.to_string())
        .bind(base.to_string())
        .execute(&pool)
        .await
        .unwrap();

    let ticket = store.get(channel).await.unwrap().unwrap();
    assert!(!ticket.is_closed());
    assert!(ticket.participants().is_empty());

    cleanup(&store, &[channel]).await;
}

#[tokio::test]
#[ignore]
async fn legacy_participant_lists_match_after_trimming() {
    let (store, pool) = store().await;
    let base = base_id();
    let channel = ChannelId::new(base + 1);

    sqlx::query("INSERT INTO tickets (channel_id, user_id, added_users) VALUES ($1, $2, $3)")
        .bind(channel.to_string())
        .bind(base.to_string())
        .bind(format!("{}, {}", base + 5, base + 6))
        .execute(&pool)
        .await
        .unwrap();

    assert!(!store.add_participant(channel, UserId::new(base + 6)).await.unwrap());
    assert!(store.add_participant(channel, UserId::new(base + 7)).await.unwrap());

    let ticket = store.get(channel).await.unwrap().unwrap();
    assert_eq!(
        ticket.participants(),
        &[
            UserId::new(base + 5),
            UserId::new(base + 6),
            UserId::new(base + 7)
        ]
    );

    cleanup(&store, &[channel]).await;
}

/// Single-connection pool resolving unqualified names in a fresh `schema`.
async fn pool_in_new_schema(schema: &str) -> PgPool {
    let url = database_url();
    let admin = PgPool::connect(&url).await.expect("connect");
    let create = format!("CREATE SCHEMA {}", schema);
    sqlx::query(&create).execute(&admin).await.unwrap();
    admin.close().await;

    let options = PgConnectOptions::from_str(&url)
        .unwrap()
        .options([("search_path", schema)]);
    PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect to schema")
}

#[tokio::test]
#[ignore]
async fn legacy_store_is_upgraded_in_place() {
    let schema = format!("ticketdesk_legacy_{}", base_id());
    let pool = pool_in_new_schema(&schema).await;

    // Layout written before tickets could be closed.
    sqlx::query(
        "CREATE TABLE tickets (channel_id TEXT PRIMARY KEY, user_id TEXT NOT NULL, added_users TEXT)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO tickets (channel_id, user_id, added_users) VALUES \
         ('1001', '7', '8'), ('1002', '7', ''), ('1003', '9', NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();

    run_migrations(&pool).await.unwrap();

    let rows = sqlx::query("SELECT channel_id, closed FROM tickets ORDER BY channel_id")
        .fetch_all(&pool)
        .await
        .unwrap();
    let closed: Vec<(String, bool)> = rows
        .iter()
        .map(|row| (row.get("channel_id"), row.get("closed")))
        .collect();
    assert_eq!(
        closed,
        vec![
            ("1001".to_string(), true),
            ("1002".to_string(), false),
            ("1003".to_string(), false),
        ]
    );

    let index: String = sqlx::query(
        "SELECT indexdef FROM pg_indexes WHERE schemaname = $1 AND indexname = 'tickets_one_open_per_owner'",
    )
    .bind(&schema)
    .fetch_one(&pool)
    .await
    .unwrap()
    .get("indexdef");
    assert!(index.contains("UNIQUE"));
    assert!(index.contains("WHERE (NOT closed)"));

    let store = PostgresTicketStore::new(pool.clone());
    let open = store.get_open_by_owner(UserId::new(7)).await.unwrap().unwrap();
    assert_eq!(open.channel_id(), ChannelId::new(1002));
    let reclaimed = store.get(ChannelId::new(1001)).await.unwrap().unwrap();
    assert_eq!(reclaimed.participants(), &[UserId::new(8)]);
    let err = store
        .insert(&Ticket::open(ChannelId::new(1004), UserId::new(9)))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TicketAlreadyOpen);

    let drop = format!("DROP SCHEMA {} CASCADE", schema);
    sqlx::query(&drop).execute(&pool).await.unwrap();
}
