//! Discord REST payloads.
//!
//! Serde types for the subset of the v10 API the ticket workflow touches,
//! plus conversions to and from the port's neutral message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{ChannelId, MessageId, RoleId, Timestamp, UserId};
use crate::ports::{
    Button, ButtonStyle, ChannelMessage, Embed, EmbedField, Member, OutgoingMessage,
    OverwriteTarget, Permission, PermissionOverwrite, PlatformError,
};

/// `Invalid Form Body`; the `errors` tree names the offending fields.
pub const INVALID_FORM_BODY: u32 = 50035;

const GUILD_TEXT: u8 = 0;
const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const OVERWRITE_ROLE: u8 = 0;
const OVERWRITE_MEMBER: u8 = 1;

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct CreateChannelBody {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub parent_id: String,
    pub permission_overwrites: Vec<OverwriteBody>,
}

impl CreateChannelBody {
    pub fn text(name: &str, parent_id: String, overwrites: &[PermissionOverwrite]) -> Self {
        Self {
            name: name.to_string(),
            kind: GUILD_TEXT,
            parent_id,
            permission_overwrites: overwrites.iter().map(OverwriteBody::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OverwriteBody {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub allow: String,
    pub deny: String,
}

impl From<&PermissionOverwrite> for OverwriteBody {
    fn from(overwrite: &PermissionOverwrite) -> Self {
        let kind = match overwrite.target {
            OverwriteTarget::Role(_) => OVERWRITE_ROLE,
            OverwriteTarget::Member(_) => OVERWRITE_MEMBER,
        };
        Self {
            id: overwrite.target.id().to_string(),
            kind,
            allow: Permission::bits(&overwrite.allow).to_string(),
            deny: Permission::bits(&overwrite.deny).to_string(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<EmbedBody>,
    pub components: Vec<ActionRowBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

impl From<&OutgoingMessage> for MessageBody {
    fn from(message: &OutgoingMessage) -> Self {
        Self {
            content: message.content.clone(),
            embeds: message.embed.iter().map(EmbedBody::from).collect(),
            components: ActionRowBody::wrap(&message.buttons),
            attachments: message
                .attachment
                .iter()
                .enumerate()
                .map(|(i, a)| AttachmentRef {
                    id: i as u32,
                    filename: a.filename.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentRef {
    pub id: u32,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct EditComponentsBody {
    pub components: Vec<ActionRowBody>,
}

#[derive(Debug, Serialize)]
pub struct RenameBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateDmBody {
    pub recipient_id: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Shared message parts
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct EmbedBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedFieldBody>,
}

impl From<&Embed> for EmbedBody {
    fn from(embed: &Embed) -> Self {
        Self {
            title: Some(embed.title.clone()),
            description: (!embed.description.is_empty()).then(|| embed.description.clone()),
            color: Some(embed.color),
            fields: embed
                .fields
                .iter()
                .map(|f| EmbedFieldBody {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
        }
    }
}

impl From<EmbedBody> for Embed {
    fn from(body: EmbedBody) -> Self {
        Embed {
            title: body.title.unwrap_or_default(),
            description: body.description.unwrap_or_default(),
            color: body.color.unwrap_or_default(),
            fields: body
                .fields
                .into_iter()
                .map(|f| EmbedField {
                    name: f.name,
                    value: f.value,
                    inline: f.inline,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedFieldBody {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionRowBody {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub components: Vec<ComponentBody>,
}

impl ActionRowBody {
    /// One row holding every button, or no rows at all.
    pub fn wrap(buttons: &[Button]) -> Vec<ActionRowBody> {
        if buttons.is_empty() {
            return Vec::new();
        }
        vec![ActionRowBody {
            kind: ACTION_ROW,
            components: buttons.iter().map(ComponentBody::from).collect(),
        }]
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentBody {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl From<&Button> for ComponentBody {
    fn from(button: &Button) -> Self {
        Self {
            kind: BUTTON,
            style: Some(style_code(button.style)),
            label: Some(button.label.clone()),
            custom_id: button.custom_id.clone(),
            url: button.url.clone(),
            disabled: button.disabled,
        }
    }
}

impl ComponentBody {
    fn into_button(self) -> Option<Button> {
        if self.kind != BUTTON {
            return None;
        }
        Some(Button {
            custom_id: self.custom_id,
            url: self.url,
            label: self.label.unwrap_or_default(),
            style: style_from_code(self.style.unwrap_or(2)),
            disabled: self.disabled,
        })
    }
}

fn style_code(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Primary => 1,
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
        ButtonStyle::Link => 5,
    }
}

fn style_from_code(code: u8) -> ButtonStyle {
    match code {
        1 => ButtonStyle::Primary,
        3 => ButtonStyle::Success,
        4 => ButtonStyle::Danger,
        5 => ButtonStyle::Link,
        _ => ButtonStyle::Secondary,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct ChannelObject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentObject {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UserObject {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl UserObject {
    /// `name#1234` for legacy accounts, plain username otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub author: Option<UserObject>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub embeds: Vec<EmbedBody>,
    #[serde(default)]
    pub components: Vec<ActionRowBody>,
    #[serde(default)]
    pub attachments: Vec<AttachmentObject>,
}

impl MessageObject {
    pub fn into_channel_message(self) -> Result<ChannelMessage, PlatformError> {
        let author = self
            .author
            .ok_or_else(|| PlatformError::Decode(format!("message {} has no author", self.id)))?;
        let timestamp = match self.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw)?,
            None => Timestamp::now(),
        };
        Ok(ChannelMessage {
            id: parse_id::<MessageId>(&self.id)?,
            author_id: parse_id::<UserId>(&author.id)?,
            author_name: author.tag(),
            content: self.content,
            timestamp,
            embeds: self.embeds.into_iter().map(Embed::from).collect(),
            buttons: self
                .components
                .into_iter()
                .flat_map(|row| row.components)
                .filter_map(ComponentBody::into_button)
                .collect(),
            attachment_urls: self.attachments.into_iter().map(|a| a.url).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberObject {
    pub user: UserObject,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl MemberObject {
    pub fn into_member(self) -> Result<Member, PlatformError> {
        Ok(Member {
            user_id: parse_id::<UserId>(&self.user.id)?,
            tag: self.user.tag(),
            role_ids: self
                .roles
                .iter()
                .map(|r| parse_id::<RoleId>(r))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl ErrorBody {
    /// Whether the `errors` tree mentions `field` at any depth.
    pub fn mentions_field(&self, field: &str) -> bool {
        fn walk(value: &Value, field: &str) -> bool {
            match value {
                Value::Object(map) => map.iter().any(|(k, v)| k == field || walk(v, field)),
                Value::Array(items) => items.iter().any(|v| walk(v, field)),
                _ => false,
            }
        }
        self.errors.as_ref().is_some_and(|e| walk(e, field))
    }
}

/// Map a failed response to a `PlatformError`.
pub fn error_from_response(status: u16, body: &str) -> PlatformError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.to_string()
    } else {
        parsed.message.clone()
    };

    if parsed.code == INVALID_FORM_BODY && parsed.mentions_field("parent_id") {
        return PlatformError::InvalidParent(message);
    }
    match status {
        404 => PlatformError::NotFound(message),
        403 => PlatformError::Forbidden(message),
        _ => PlatformError::rejected(status, message),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

pub fn parse_id<T>(raw: &str) -> Result<T, PlatformError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| PlatformError::Decode(format!("bad snowflake '{}': {}", raw, e)))
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, PlatformError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
        .map_err(|e| PlatformError::Decode(format!("bad timestamp '{}': {}", raw, e)))
}

/// Parse the id out of a channel object.
pub fn channel_id_of(object: &ChannelObject) -> Result<ChannelId, PlatformError> {
    parse_id::<ChannelId>(&object.id)
}
