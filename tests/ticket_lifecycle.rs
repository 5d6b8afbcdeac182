//! Integration tests for the ticket lifecycle.
//!
//! Each scenario drives `ActionDispatcher` the way the platform layer would:
//! menu selections, button presses and form submissions in, ephemeral
//! replies out. Uses the in-memory store, the mock platform and the real
//! HTML exporter, so no network or database is needed.

use std::sync::Arc;

use ticketdesk::adapters::{HtmlTranscriptExporter, InMemoryTicketStore, MockChatPlatform};
use ticketdesk::adapters::platform::MOCK_BOT_USER_ID;
use ticketdesk::application::{ActionDispatcher, TicketServices, CLOSE_GRACE_PERIOD};
use ticketdesk::config::{ServiceIdentity, TicketingConfig};
use ticketdesk::domain::foundation::{CategoryId, ChannelId, GuildId, RoleId, UserId};
use ticketdesk::domain::ticket::{ActionEvent, ActionKind, ActionResponse, Actor, TicketType};
use ticketdesk::ports::{ChatPlatform, Member, OverwriteTarget, Permission, TicketStore};

// =============================================================================
// Test Infrastructure
// =============================================================================

const GUILD: GuildId = GuildId::new(1);
const SUPPORT_CATEGORY: CategoryId = CategoryId::new(20);
const AUDIT: ChannelId = ChannelId::new(30);
const ADMIN_ROLE: RoleId = RoleId::new(40);

const ALICE: UserId = UserId::new(101);
const BRUNO: UserId = UserId::new(102);
const ADMIN: UserId = UserId::new(103);

/// A dummy channel the ticket menu lives in.
const MENU_CHANNEL: ChannelId = ChannelId::new(5);

struct Desk {
    store: InMemoryTicketStore,
    platform: MockChatPlatform,
    dispatcher: ActionDispatcher,
}

impl Desk {
    fn new() -> Self {
        let store = InMemoryTicketStore::new();
        let platform = MockChatPlatform::new();
        platform.add_category(SUPPORT_CATEGORY);
        platform.add_channel(AUDIT, "ticket-audit");
        for actor in [alice(), bruno(), admin()] {
            platform.add_member(Member {
                user_id: actor.id,
                tag: actor.tag.clone(),
                role_ids: actor.role_ids.clone(),
            });
        }

        let platform_port: Arc<dyn ChatPlatform> = Arc::new(platform.clone());
        let dispatcher = ActionDispatcher::new(TicketServices {
            store: Arc::new(store.clone()),
            platform: platform_port.clone(),
            exporter: Arc::new(HtmlTranscriptExporter::new(platform_port.clone())),
            config: Arc::new(ticketing()),
            identity: ServiceIdentity {
                guild_id: GUILD,
                user_id: MOCK_BOT_USER_ID,
            },
        });

        Self {
            store,
            platform,
            dispatcher,
        }
    }

    async fn act(&self, actor: Actor, channel_id: ChannelId, kind: ActionKind) -> ActionResponse {
        self.dispatcher
            .dispatch(ActionEvent::new(actor, channel_id, kind))
            .await
    }

    /// Select a ticket type from the menu and return the new channel.
    async fn open(&self, actor: Actor, slug: &str) -> ChannelId {
        let response = self
            .act(
                actor.clone(),
                MENU_CHANNEL,
                ActionKind::SelectTicketType {
                    value: slug.to_string(),
                },
            )
            .await;
        assert!(
            matches!(&response, ActionResponse::Message(m) if m.starts_with("✅")),
            "open failed: {:?}",
            response
        );
        self.store
            .get_open_by_owner(actor.id)
            .await
            .unwrap()
            .expect("open ticket")
            .channel_id()
    }

    async fn open_count(&self, owner: UserId) -> usize {
        self.store
            .all()
            .await
            .unwrap()
            .iter()
            .filter(|t| t.owner_id() == owner && !t.is_closed())
            .count()
    }
}

fn ticketing() -> TicketingConfig {
    TicketingConfig {
        admin_role_id: Some(ADMIN_ROLE),
        audit_channel_id: AUDIT,
        ticket_types: vec![
            TicketType {
                name: "Billing".to_string(),
                description: "Invoices and refunds".to_string(),
                category_id: SUPPORT_CATEGORY,
                emoji: None,
                role_id: None,
            },
            TicketType {
                name: "Bug Report".to_string(),
                description: String::new(),
                category_id: SUPPORT_CATEGORY,
                emoji: None,
                role_id: None,
            },
        ],
    }
}

fn alice() -> Actor {
    Actor::new(ALICE, "alice")
}

fn bruno() -> Actor {
    Actor::new(BRUNO, "bruno")
}

fn admin() -> Actor {
    Actor::new(ADMIN, "admin").with_roles(vec![ADMIN_ROLE])
}

fn reply(text: &str) -> ActionResponse {
    ActionResponse::Message(text.to_string())
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn second_open_is_denied_while_channel_is_reachable() {
    let desk = Desk::new();

    let channel_id = desk.open(alice(), "billing").await;
    let ticket = desk.store.get(channel_id).await.unwrap().unwrap();
    assert!(!ticket.is_closed());
    assert!(ticket.participants().is_empty());

    let again = desk
        .act(
            alice(),
            MENU_CHANNEL,
            ActionKind::SelectTicketType {
                value: "bug_report".to_string(),
            },
        )
        .await;

    assert_eq!(
        again,
        ActionResponse::Message(format!("⚠️ You already have an open ticket: <#{}>", channel_id))
    );
    assert_eq!(desk.platform.created_channels().len(), 1);
    assert_eq!(desk.open_count(ALICE).await, 1);
}

#[tokio::test]
async fn duplicate_participant_adds_are_absorbed() {
    let desk = Desk::new();
    let channel_id = desk.open(alice(), "billing").await;
    let submit = || ActionKind::AddParticipantSubmitted {
        target: BRUNO.to_string(),
        reason: "handles refunds".to_string(),
    };

    assert_eq!(
        desk.act(alice(), channel_id, ActionKind::AddUser).await,
        ActionResponse::ShowAddParticipantForm
    );
    desk.act(alice(), channel_id, submit()).await;
    desk.act(alice(), channel_id, submit()).await;

    let ticket = desk.store.get(channel_id).await.unwrap().unwrap();
    assert_eq!(ticket.participants(), &[BRUNO]);
}

#[tokio::test]
async fn unknown_participant_is_rejected_without_changes() {
    let desk = Desk::new();
    let channel_id = desk.open(alice(), "billing").await;

    let response = desk
        .act(
            alice(),
            channel_id,
            ActionKind::AddParticipantSubmitted {
                target: "424242".to_string(),
                reason: String::new(),
            },
        )
        .await;

    assert_eq!(response, reply("⚠️ User not found."));
    let ticket = desk.store.get(channel_id).await.unwrap().unwrap();
    assert!(ticket.participants().is_empty());
}

#[tokio::test(start_paused = true)]
async fn admin_close_delivers_independently_and_audits_bounces() {
    let desk = Desk::new();
    let channel_id = desk.open(alice(), "billing").await;
    desk.act(
        alice(),
        channel_id,
        ActionKind::AddParticipantSubmitted {
            target: BRUNO.to_string(),
            reason: "second opinion".to_string(),
        },
    )
    .await;
    desk.platform
        .post_user_message(channel_id, ALICE, "alice", "I was charged twice");
    desk.platform.fail_direct_messages_to(BRUNO);

    let started = tokio::time::Instant::now();
    let response = desk.act(admin(), channel_id, ActionKind::CloseTicket).await;

    assert_eq!(response, reply("🔒 Ticket closed."));
    assert!(started.elapsed() >= CLOSE_GRACE_PERIOD);
    assert!(desk.store.get(channel_id).await.unwrap().unwrap().is_closed());

    for user in [ALICE, BRUNO] {
        let overwrite = desk
            .platform
            .overwrite_for(channel_id, OverwriteTarget::Member(user))
            .unwrap();
        assert!(overwrite.deny.contains(&Permission::ViewChannel));
        assert!(overwrite.allow.is_empty());
    }

    let alice_dms = desk.platform.direct_messages(ALICE);
    assert_eq!(alice_dms.len(), 1);
    assert_eq!(alice_dms[0].attachment_urls.len(), 1);
    assert!(desk.platform.direct_messages(BRUNO).is_empty());

    let audit = desk.platform.messages(AUDIT);
    let bounce = audit
        .iter()
        .find(|m| m.embeds.first().is_some_and(|e| e.title == "Direct message failed"))
        .expect("bounce notice");
    assert!(bounce.embeds[0].description.contains(&format!("<@{}>", BRUNO)));
    let archived = desk.platform.attachments(AUDIT);
    assert_eq!(archived.len(), 1);
    let html = String::from_utf8(archived[0].content.clone()).unwrap();
    assert!(html.contains("I was charged twice"));
}

#[tokio::test(start_paused = true)]
async fn second_close_is_rejected() {
    let desk = Desk::new();
    let channel_id = desk.open(alice(), "billing").await;

    desk.act(alice(), channel_id, ActionKind::CloseTicket).await;
    let again = desk.act(alice(), channel_id, ActionKind::CloseTicket).await;

    assert_eq!(again, reply("⚠️ This ticket is already closed."));
    assert_eq!(desk.platform.direct_messages(ALICE).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sequential_opens_keep_one_open_ticket_per_owner() {
    let desk = Desk::new();

    let first = desk.open(alice(), "billing").await;
    desk.act(alice(), first, ActionKind::CloseTicket).await;
    let second = desk.open(alice(), "bug_report").await;

    assert_ne!(first, second);
    assert_eq!(desk.store.all().await.unwrap().len(), 2);
    assert_eq!(desk.open_count(ALICE).await, 1);
}

#[tokio::test(start_paused = true)]
async fn delete_keeps_record_until_reconciliation() {
    let desk = Desk::new();
    let channel_id = desk.open(alice(), "billing").await;
    desk.act(alice(), channel_id, ActionKind::CloseTicket).await;

    let denied = desk.act(alice(), channel_id, ActionKind::DeleteTicket).await;
    assert_eq!(
        denied,
        reply("⚠️ You do not have permission to delete this ticket.")
    );

    let deleted = desk.act(admin(), channel_id, ActionKind::DeleteTicket).await;
    assert_eq!(deleted, reply("🗑️ Ticket deleted."));
    assert!(desk.platform.channel(channel_id).is_none());
    assert!(desk.store.get(channel_id).await.unwrap().is_some());

    let reconciler = TicketServices {
        store: Arc::new(desk.store.clone()),
        platform: Arc::new(desk.platform.clone()),
        exporter: Arc::new(HtmlTranscriptExporter::new(Arc::new(desk.platform.clone()))),
        config: Arc::new(ticketing()),
        identity: ServiceIdentity {
            guild_id: GUILD,
            user_id: MOCK_BOT_USER_ID,
        },
    }
    .reconciler();
    let report = reconciler.handle().await.unwrap();

    assert_eq!(report.purged, vec![channel_id]);
    assert!(desk.store.get(channel_id).await.unwrap().is_none());
}

#[tokio::test]
async fn out_of_band_deletion_is_reclaimed_on_next_open() {
    let desk = Desk::new();
    let stale = desk.open(alice(), "billing").await;
    desk.platform.remove_channel(stale);

    let fresh = desk.open(alice(), "billing").await;

    assert_ne!(stale, fresh);
    assert!(desk.store.get(stale).await.unwrap().unwrap().is_closed());
    assert_eq!(desk.open_count(ALICE).await, 1);
}

#[tokio::test]
async fn participant_prints_transcript() {
    let desk = Desk::new();
    let channel_id = desk.open(alice(), "billing").await;
    desk.act(
        alice(),
        channel_id,
        ActionKind::AddParticipantSubmitted {
            target: BRUNO.to_string(),
            reason: String::new(),
        },
    )
    .await;

    let response = desk.act(bruno(), channel_id, ActionKind::PrintTicket).await;

    assert_eq!(response, reply("📨 Transcript sent to your direct messages."));
    let dms = desk.platform.direct_messages(BRUNO);
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].embeds[0].title, "Ticket transcript");
}

#[tokio::test]
async fn provisioning_failure_leaves_no_record() {
    let desk = Desk::new();
    let mut config = ticketing();
    config.ticket_types[0].category_id = CategoryId::new(999);
    let platform_port: Arc<dyn ChatPlatform> = Arc::new(desk.platform.clone());
    let dispatcher = ActionDispatcher::new(TicketServices {
        store: Arc::new(desk.store.clone()),
        platform: platform_port.clone(),
        exporter: Arc::new(HtmlTranscriptExporter::new(platform_port)),
        config: Arc::new(config),
        identity: ServiceIdentity {
            guild_id: GUILD,
            user_id: MOCK_BOT_USER_ID,
        },
    });

    let response = dispatcher
        .dispatch(ActionEvent::new(
            alice(),
            MENU_CHANNEL,
            ActionKind::SelectTicketType {
                value: "billing".to_string(),
            },
        ))
        .await;

    let ActionResponse::Message(text) = response else {
        panic!("expected a message");
    };
    assert!(text.starts_with("❌ An error occurred while creating the ticket."));
    assert!(desk.store.is_empty().await);
    assert!(desk.platform.created_channels().is_empty());
}
