//! Chat platform port.
//!
//! Everything the ticket workflow needs from the chat platform: channel
//! provisioning and permission edits, messages, direct messages and member
//! lookup. Each call is a single fallible request; no retries are implied.
//!
//! The message model here is deliberately neutral (text, one embed, one row
//! of buttons, one attachment). Visual polish belongs to the adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{CategoryId, ChannelId, MessageId, RoleId, Timestamp, UserId};
use crate::domain::ticket::TicketError;

/// Port for the chat platform's REST surface.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Create a text channel.
    ///
    /// # Errors
    ///
    /// - `InvalidParent` when the category does not exist or is not a category
    async fn create_channel(&self, spec: &ChannelSpec) -> Result<Channel, PlatformError>;

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError>;

    async fn rename_channel(&self, channel_id: ChannelId, name: &str)
        -> Result<(), PlatformError>;

    /// Create or replace one permission overwrite.
    async fn edit_permissions(
        &self,
        channel_id: ChannelId,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), PlatformError>;

    /// Look up a channel. `Ok(None)` when it does not exist.
    async fn fetch_channel(&self, channel_id: ChannelId) -> Result<Option<Channel>, PlatformError>;

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError>;

    /// Up to `limit` messages older than `before` (newest first), or the
    /// latest messages when `before` is `None`.
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, PlatformError>;

    /// Replace the buttons on an existing message.
    async fn edit_message_buttons(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        buttons: &[Button],
    ) -> Result<(), PlatformError>;

    async fn send_direct_message(
        &self,
        user_id: UserId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError>;

    /// Look up a guild member. `Ok(None)` when the user is not a member.
    async fn fetch_member(&self, user_id: UserId) -> Result<Option<Member>, PlatformError>;
}

// ════════════════════════════════════════════════════════════════════════════
// Channels and permissions
// ════════════════════════════════════════════════════════════════════════════

/// A channel as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    /// Whether the bot can still view the channel.
    pub viewable: bool,
}

/// Request to provision a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub parent: CategoryId,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Permissions the workflow grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewChannel,
    SendMessages,
    ManageChannels,
}

impl Permission {
    /// Platform permission bit.
    pub fn bit(&self) -> u64 {
        match self {
            Permission::ManageChannels => 1 << 4,
            Permission::ViewChannel => 1 << 10,
            Permission::SendMessages => 1 << 11,
        }
    }

    pub fn bits(permissions: &[Permission]) -> u64 {
        permissions.iter().fold(0, |acc, p| acc | p.bit())
    }
}

/// Who an overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteTarget {
    Role(RoleId),
    Member(UserId),
}

impl OverwriteTarget {
    pub fn id(&self) -> u64 {
        match self {
            OverwriteTarget::Role(id) => id.get(),
            OverwriteTarget::Member(id) => id.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

impl PermissionOverwrite {
    pub fn allow(target: OverwriteTarget, allow: Vec<Permission>) -> Self {
        Self {
            target,
            allow,
            deny: Vec::new(),
        }
    }

    pub fn deny(target: OverwriteTarget, deny: Vec<Permission>) -> Self {
        Self {
            target,
            allow: Vec::new(),
            deny,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Messages
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Set for interactive buttons.
    pub custom_id: Option<String>,
    /// Set for link buttons.
    pub url: Option<String>,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Button {
    pub fn action(custom_id: &str, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: Some(custom_id.to_string()),
            url: None,
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn link(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            custom_id: None,
            url: Some(url.into()),
            label: label.into(),
            style: ButtonStyle::Link,
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is(&self, custom_id: &str) -> bool {
        self.custom_id.as_deref() == Some(custom_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            fields: Vec::new(),
        }
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub buttons: Vec<Button>,
    pub attachment: Option<Attachment>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Handle to a message the bot just sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// CDN URLs of uploaded attachments, in upload order.
    pub attachment_urls: Vec<String>,
}

/// A message read back from channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub timestamp: Timestamp,
    pub embeds: Vec<Embed>,
    pub buttons: Vec<Button>,
    pub attachment_urls: Vec<String>,
}

/// A guild member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub tag: String,
    pub role_ids: Vec<RoleId>,
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The parent category of a new channel was rejected.
    #[error("invalid parent category: {0}")]
    InvalidParent(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl PlatformError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        PlatformError::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl From<PlatformError> for TicketError {
    fn from(err: PlatformError) -> Self {
        TicketError::Unexpected(format!("platform: {}", err))
    }
}
