//! Mock chat platform for testing.
//!
//! An in-memory guild implementing `ChatPlatform`. Supports:
//! - Channels, categories, members and message history
//! - Error injection per method, per DM recipient and per channel
//! - Call tracking

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{CategoryId, ChannelId, MessageId, Timestamp, UserId};
use crate::ports::{
    Attachment, Button, Channel, ChannelMessage, ChannelSpec, ChatPlatform, Member,
    OutgoingMessage, OverwriteTarget, PermissionOverwrite, PlatformError, SentMessage,
};

/// User id the mock posts as.
pub const MOCK_BOT_USER_ID: UserId = UserId::new(900_000);

const FIRST_GENERATED_ID: u64 = 1_000_000;

/// Mock chat platform for testing.
///
/// # Example
///
/// ```ignore
/// let platform = MockChatPlatform::new();
/// platform.add_category(CategoryId::new(10));
/// platform.add_member(Member { user_id: UserId::new(7), tag: "bob".into(), role_ids: vec![] });
///
/// // Inject errors
/// platform.fail_direct_messages_to(UserId::new(7));
/// ```
#[derive(Clone, Default)]
pub struct MockChatPlatform {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    categories: HashSet<CategoryId>,
    channels: HashMap<ChannelId, MockChannel>,
    members: HashMap<UserId, Member>,
    dm_channels: HashMap<UserId, ChannelId>,
    next_id: u64,

    method_errors: HashMap<String, PlatformError>,
    dm_failures: HashSet<UserId>,
    send_failures: HashSet<ChannelId>,

    call_log: Vec<MethodCall>,
}

struct MockChannel {
    channel: Channel,
    parent: Option<CategoryId>,
    overwrites: Vec<PermissionOverwrite>,
    /// Oldest first.
    messages: Vec<MockMessage>,
}

struct MockMessage {
    message: ChannelMessage,
    attachment: Option<Attachment>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockChatPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Register a category that new channels may be parented to.
    pub fn add_category(&self, category_id: CategoryId) {
        self.state().categories.insert(category_id);
    }

    pub fn add_member(&self, member: Member) {
        self.state().members.insert(member.user_id, member);
    }

    /// Add a pre-existing text channel (for example the audit channel).
    pub fn add_channel(&self, channel_id: ChannelId, name: &str) {
        self.state().channels.insert(
            channel_id,
            MockChannel::new(channel_id, name.to_string(), None),
        );
    }

    /// Simulate the channel being deleted outside the workflow.
    pub fn remove_channel(&self, channel_id: ChannelId) {
        self.state().channels.remove(&channel_id);
    }

    /// Simulate the bot losing view access to a channel.
    pub fn hide_channel(&self, channel_id: ChannelId) {
        if let Some(ch) = self.state().channels.get_mut(&channel_id) {
            ch.channel.viewable = false;
        }
    }

    /// Append a message written by a user.
    pub fn post_user_message(
        &self,
        channel_id: ChannelId,
        author_id: UserId,
        author_name: &str,
        content: &str,
    ) -> Option<MessageId> {
        let mut state = self.state();
        let id = MessageId::new(state.allocate_id());
        let ch = state.channels.get_mut(&channel_id)?;
        ch.messages.push(MockMessage {
            message: ChannelMessage {
                id,
                author_id,
                author_name: author_name.to_string(),
                content: content.to_string(),
                timestamp: Timestamp::now(),
                embeds: Vec::new(),
                buttons: Vec::new(),
                attachment_urls: Vec::new(),
            },
            attachment: None,
        });
        Some(id)
    }

    /// Fail every call to `method` with `error` until cleared.
    pub fn fail_method(&self, method: &str, error: PlatformError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Refuse direct messages to `user_id`.
    pub fn fail_direct_messages_to(&self, user_id: UserId) {
        self.state().dm_failures.insert(user_id);
    }

    /// Refuse messages posted into `channel_id`.
    pub fn fail_sends_to(&self, channel_id: ChannelId) {
        self.state().send_failures.insert(channel_id);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.method_errors.clear();
        state.dm_failures.clear();
        state.send_failures.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn channel(&self, channel_id: ChannelId) -> Option<Channel> {
        self.state()
            .channels
            .get(&channel_id)
            .map(|ch| ch.channel.clone())
    }

    pub fn channel_parent(&self, channel_id: ChannelId) -> Option<CategoryId> {
        self.state()
            .channels
            .get(&channel_id)
            .and_then(|ch| ch.parent)
    }

    /// Channels created through `create_channel`, in id order.
    pub fn created_channels(&self) -> Vec<Channel> {
        let state = self.state();
        let mut channels: Vec<Channel> = state
            .channels
            .values()
            .filter(|ch| ch.parent.is_some())
            .map(|ch| ch.channel.clone())
            .collect();
        channels.sort_by_key(|c| c.id);
        channels
    }

    pub fn overwrite_for(
        &self,
        channel_id: ChannelId,
        target: OverwriteTarget,
    ) -> Option<PermissionOverwrite> {
        self.state()
            .channels
            .get(&channel_id)?
            .overwrites
            .iter()
            .find(|o| o.target == target)
            .cloned()
    }

    /// Messages in a channel, oldest first.
    pub fn messages(&self, channel_id: ChannelId) -> Vec<ChannelMessage> {
        self.state()
            .channels
            .get(&channel_id)
            .map(|ch| ch.messages.iter().map(|m| m.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Attachments uploaded to a channel, oldest first.
    pub fn attachments(&self, channel_id: ChannelId) -> Vec<Attachment> {
        self.state()
            .channels
            .get(&channel_id)
            .map(|ch| {
                ch.messages
                    .iter()
                    .filter_map(|m| m.attachment.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Direct messages delivered to a user, oldest first.
    pub fn direct_messages(&self, user_id: UserId) -> Vec<ChannelMessage> {
        let dm_channel = self.state().dm_channels.get(&user_id).copied();
        dm_channel
            .map(|id| self.messages(id))
            .unwrap_or_default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PlatformError> {
        match self.state().method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl MockState {
    fn allocate_id(&mut self) -> u64 {
        if self.next_id < FIRST_GENERATED_ID {
            self.next_id = FIRST_GENERATED_ID;
        }
        self.next_id += 1;
        self.next_id
    }

    fn post(
        &mut self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError> {
        let id = MessageId::new(self.allocate_id());
        let ch = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel_id)))?;

        let attachment_urls: Vec<String> = message
            .attachment
            .iter()
            .map(|a| {
                format!(
                    "https://cdn.mock/attachments/{}/{}/{}",
                    channel_id, id, a.filename
                )
            })
            .collect();

        ch.messages.push(MockMessage {
            message: ChannelMessage {
                id,
                author_id: MOCK_BOT_USER_ID,
                author_name: "Ticket Bot".to_string(),
                content: message.content.clone().unwrap_or_default(),
                timestamp: Timestamp::now(),
                embeds: message.embed.iter().cloned().collect(),
                buttons: message.buttons.clone(),
                attachment_urls: attachment_urls.clone(),
            },
            attachment: message.attachment.clone(),
        });

        Ok(SentMessage {
            id,
            channel_id,
            attachment_urls,
        })
    }
}

impl MockChannel {
    fn new(id: ChannelId, name: String, parent: Option<CategoryId>) -> Self {
        Self {
            channel: Channel {
                id,
                name,
                viewable: true,
            },
            parent,
            overwrites: Vec::new(),
            messages: Vec::new(),
        }
    }
}

#[async_trait]
impl ChatPlatform for MockChatPlatform {
    async fn create_channel(&self, spec: &ChannelSpec) -> Result<Channel, PlatformError> {
        self.record_call(
            "create_channel",
            vec![spec.name.clone(), spec.parent.to_string()],
        );
        self.check_error("create_channel")?;

        let mut state = self.state();
        if !state.categories.contains(&spec.parent) {
            return Err(PlatformError::InvalidParent(format!(
                "category {} does not exist",
                spec.parent
            )));
        }

        let id = ChannelId::new(state.allocate_id());
        let mut ch = MockChannel::new(id, spec.name.clone(), Some(spec.parent));
        ch.overwrites = spec.overwrites.clone();
        let channel = ch.channel.clone();
        state.channels.insert(id, ch);
        Ok(channel)
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError> {
        self.record_call("delete_channel", vec![channel_id.to_string()]);
        self.check_error("delete_channel")?;

        self.state()
            .channels
            .remove(&channel_id)
            .map(|_| ())
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel_id)))
    }

    async fn rename_channel(
        &self,
        channel_id: ChannelId,
        name: &str,
    ) -> Result<(), PlatformError> {
        self.record_call(
            "rename_channel",
            vec![channel_id.to_string(), name.to_string()],
        );
        self.check_error("rename_channel")?;

        let mut state = self.state();
        let ch = state
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel_id)))?;
        ch.channel.name = name.to_string();
        Ok(())
    }

    async fn edit_permissions(
        &self,
        channel_id: ChannelId,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), PlatformError> {
        self.record_call(
            "edit_permissions",
            vec![channel_id.to_string(), overwrite.target.id().to_string()],
        );
        self.check_error("edit_permissions")?;

        let mut state = self.state();
        let ch = state
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel_id)))?;
        ch.overwrites.retain(|o| o.target != overwrite.target);
        ch.overwrites.push(overwrite.clone());
        Ok(())
    }

    async fn fetch_channel(&self, channel_id: ChannelId) -> Result<Option<Channel>, PlatformError> {
        self.record_call("fetch_channel", vec![channel_id.to_string()]);
        self.check_error("fetch_channel")?;

        Ok(self.channel(channel_id))
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError> {
        self.record_call("send_message", vec![channel_id.to_string()]);
        self.check_error("send_message")?;

        let mut state = self.state();
        if state.send_failures.contains(&channel_id) {
            return Err(PlatformError::Forbidden(format!(
                "missing access to channel {}",
                channel_id
            )));
        }
        state.post(channel_id, message)
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, PlatformError> {
        self.record_call(
            "fetch_messages",
            vec![
                channel_id.to_string(),
                before.map(|b| b.to_string()).unwrap_or_default(),
                limit.to_string(),
            ],
        );
        self.check_error("fetch_messages")?;

        let state = self.state();
        let ch = state
            .channels
            .get(&channel_id)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel_id)))?;
        Ok(ch
            .messages
            .iter()
            .rev()
            .filter(|m| before.map_or(true, |b| m.message.id < b))
            .take(usize::from(limit))
            .map(|m| m.message.clone())
            .collect())
    }

    async fn edit_message_buttons(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        buttons: &[Button],
    ) -> Result<(), PlatformError> {
        self.record_call(
            "edit_message_buttons",
            vec![channel_id.to_string(), message_id.to_string()],
        );
        self.check_error("edit_message_buttons")?;

        let mut state = self.state();
        let message = state
            .channels
            .get_mut(&channel_id)
            .and_then(|ch| ch.messages.iter_mut().find(|m| m.message.id == message_id))
            .ok_or_else(|| PlatformError::NotFound(format!("message {}", message_id)))?;
        message.message.buttons = buttons.to_vec();
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: UserId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError> {
        self.record_call("send_direct_message", vec![user_id.to_string()]);
        self.check_error("send_direct_message")?;

        let mut state = self.state();
        if state.dm_failures.contains(&user_id) {
            return Err(PlatformError::Forbidden(
                "Cannot send messages to this user".to_string(),
            ));
        }

        let dm_channel = match state.dm_channels.get(&user_id) {
            Some(id) => *id,
            None => {
                let id = ChannelId::new(state.allocate_id());
                state
                    .channels
                    .insert(id, MockChannel::new(id, format!("dm-{}", user_id), None));
                state.dm_channels.insert(user_id, id);
                id
            }
        };
        state.post(dm_channel, message)
    }

    async fn fetch_member(&self, user_id: UserId) -> Result<Option<Member>, PlatformError> {
        self.record_call("fetch_member", vec![user_id.to_string()]);
        self.check_error("fetch_member")?;

        Ok(self.state().members.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Permission;

    const CATEGORY: CategoryId = CategoryId::new(10);

    fn spec(name: &str) -> ChannelSpec {
        ChannelSpec {
            name: name.to_string(),
            parent: CATEGORY,
            overwrites: vec![PermissionOverwrite::allow(
                OverwriteTarget::Member(UserId::new(7)),
                vec![Permission::ViewChannel],
            )],
        }
    }

    #[tokio::test]
    async fn create_channel_requires_known_category() {
        let platform = MockChatPlatform::new();
        let err = platform.create_channel(&spec("ticket-bob")).await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidParent(_)));

        platform.add_category(CATEGORY);
        let channel = platform.create_channel(&spec("ticket-bob")).await.unwrap();
        assert_eq!(channel.name, "ticket-bob");
        assert_eq!(platform.channel_parent(channel.id), Some(CATEGORY));
        assert!(platform
            .overwrite_for(channel.id, OverwriteTarget::Member(UserId::new(7)))
            .is_some());
    }

    #[tokio::test]
    async fn edit_permissions_replaces_existing_overwrite() {
        let platform = MockChatPlatform::new();
        platform.add_category(CATEGORY);
        let channel = platform.create_channel(&spec("ticket-bob")).await.unwrap();
        let target = OverwriteTarget::Member(UserId::new(7));

        platform
            .edit_permissions(
                channel.id,
                &PermissionOverwrite::deny(target, vec![Permission::ViewChannel]),
            )
            .await
            .unwrap();

        let overwrite = platform.overwrite_for(channel.id, target).unwrap();
        assert!(overwrite.allow.is_empty());
        assert_eq!(overwrite.deny, vec![Permission::ViewChannel]);
    }

    #[tokio::test]
    async fn fetch_messages_pages_newest_first() {
        let platform = MockChatPlatform::new();
        let channel = ChannelId::new(5);
        platform.add_channel(channel, "general");
        let ids: Vec<MessageId> = (0..5)
            .map(|i| {
                platform
                    .post_user_message(channel, UserId::new(7), "bob", &format!("m{}", i))
                    .unwrap()
            })
            .collect();

        let page = platform.fetch_messages(channel, None, 2).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

        let page = platform
            .fetch_messages(channel, Some(ids[3]), 100)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].id, ids[2]);
    }

    #[tokio::test]
    async fn attachments_get_urls_and_buttons_can_be_edited() {
        let platform = MockChatPlatform::new();
        let channel = ChannelId::new(5);
        platform.add_channel(channel, "audit");

        let sent = platform
            .send_message(
                channel,
                &OutgoingMessage::text("hi").with_attachment(Attachment {
                    filename: "t.html".to_string(),
                    content: b"x".to_vec(),
                }),
            )
            .await
            .unwrap();
        assert_eq!(sent.attachment_urls.len(), 1);
        assert!(sent.attachment_urls[0].ends_with("/t.html"));

        let link = Button::link(sent.attachment_urls[0].clone(), "Download transcript");
        platform
            .edit_message_buttons(channel, sent.id, &[link.clone()])
            .await
            .unwrap();
        assert_eq!(platform.messages(channel)[0].buttons, vec![link]);
    }

    #[tokio::test]
    async fn direct_message_failures_are_injectable() {
        let platform = MockChatPlatform::new();
        platform.fail_direct_messages_to(UserId::new(7));

        let err = platform
            .send_direct_message(UserId::new(7), &OutgoingMessage::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden(_)));

        platform
            .send_direct_message(UserId::new(8), &OutgoingMessage::text("hi"))
            .await
            .unwrap();
        assert_eq!(platform.direct_messages(UserId::new(8)).len(), 1);
        assert_eq!(platform.call_count("send_direct_message"), 2);
    }

    #[tokio::test]
    async fn method_errors_apply_until_cleared() {
        let platform = MockChatPlatform::new();
        platform.add_channel(ChannelId::new(5), "x");
        platform.fail_method("rename_channel", PlatformError::Transport("down".into()));

        assert!(platform
            .rename_channel(ChannelId::new(5), "y")
            .await
            .is_err());
        platform.clear_errors();
        platform.rename_channel(ChannelId::new(5), "y").await.unwrap();
        assert_eq!(platform.channel(ChannelId::new(5)).unwrap().name, "y");
    }
}
