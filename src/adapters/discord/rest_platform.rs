//! Discord REST adapter.
//!
//! Implements the `ChatPlatform` port against the Discord HTTP API (v10)
//! using a bot token.
//!
//! # Configuration
//!
//! ```ignore
//! let platform = DiscordRestPlatform::new(&config.platform)?;
//! ```

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::PlatformConfig;
use crate::domain::foundation::{ChannelId, GuildId, MessageId, UserId};
use crate::ports::{
    Button, Channel, ChannelMessage, ChannelSpec, ChatPlatform, Member, OutgoingMessage,
    PermissionOverwrite, PlatformError, SentMessage,
};

use super::wire::{
    channel_id_of, error_from_response, parse_id, ActionRowBody, ChannelObject,
    CreateChannelBody, CreateDmBody, EditComponentsBody, MemberObject, MessageBody,
    MessageObject, OverwriteBody, RenameBody,
};

/// Discord chat platform adapter.
pub struct DiscordRestPlatform {
    api_base_url: String,
    bot_token: SecretString,
    guild_id: GuildId,
    http_client: reqwest::Client,
}

impl DiscordRestPlatform {
    /// Create an adapter from platform configuration.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("ticketdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        Ok(Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            guild_id: config.guild_id,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Send an authorised request; non-2xx responses become `PlatformError`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let response = request
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", self.bot_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_from_response(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %error, "Discord request failed");
        Err(error)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, PlatformError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatPlatform for DiscordRestPlatform {
    async fn create_channel(&self, spec: &ChannelSpec) -> Result<Channel, PlatformError> {
        let url = self.url(&format!("/guilds/{}/channels", self.guild_id));
        let body = CreateChannelBody::text(&spec.name, spec.parent.to_string(), &spec.overwrites);

        let created: ChannelObject = self
            .execute_json(self.http_client.post(&url).json(&body))
            .await?;

        Ok(Channel {
            id: channel_id_of(&created)?,
            name: created.name.unwrap_or_else(|| spec.name.clone()),
            viewable: true,
        })
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError> {
        let url = self.url(&format!("/channels/{}", channel_id));
        self.execute(self.http_client.delete(&url)).await?;
        Ok(())
    }

    async fn rename_channel(
        &self,
        channel_id: ChannelId,
        name: &str,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!("/channels/{}", channel_id));
        self.execute(self.http_client.patch(&url).json(&RenameBody { name }))
            .await?;
        Ok(())
    }

    async fn edit_permissions(
        &self,
        channel_id: ChannelId,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), PlatformError> {
        let body = OverwriteBody::from(overwrite);
        let url = self.url(&format!("/channels/{}/permissions/{}", channel_id, body.id));
        let payload = json!({ "type": body.kind, "allow": body.allow, "deny": body.deny });

        self.execute(self.http_client.put(&url).json(&payload))
            .await?;
        Ok(())
    }

    async fn fetch_channel(&self, channel_id: ChannelId) -> Result<Option<Channel>, PlatformError> {
        let url = self.url(&format!("/channels/{}", channel_id));

        match self
            .execute_json::<ChannelObject>(self.http_client.get(&url))
            .await
        {
            Ok(object) => Ok(Some(Channel {
                id: channel_id,
                name: object.name.unwrap_or_default(),
                viewable: true,
            })),
            Err(PlatformError::NotFound(_)) => Ok(None),
            // The channel exists but the bot lost access to it.
            Err(PlatformError::Forbidden(_)) => Ok(Some(Channel {
                id: channel_id,
                name: String::new(),
                viewable: false,
            })),
            Err(e) => Err(e),
        }
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        let body = MessageBody::from(message);

        let request = match &message.attachment {
            Some(attachment) => {
                let payload = serde_json::to_string(&body)
                    .map_err(|e| PlatformError::Decode(e.to_string()))?;
                let form = Form::new().text("payload_json", payload).part(
                    "files[0]",
                    Part::bytes(attachment.content.clone()).file_name(attachment.filename.clone()),
                );
                self.http_client.post(&url).multipart(form)
            }
            None => self.http_client.post(&url).json(&body),
        };

        let sent: MessageObject = self.execute_json(request).await?;
        Ok(SentMessage {
            id: parse_id::<MessageId>(&sent.id)?,
            channel_id: parse_id::<ChannelId>(&sent.channel_id)?,
            attachment_urls: sent.attachments.into_iter().map(|a| a.url).collect(),
        })
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, PlatformError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        let mut query = vec![("limit", limit.to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }

        let page: Vec<MessageObject> = self
            .execute_json(self.http_client.get(&url).query(&query))
            .await?;

        page.into_iter()
            .map(MessageObject::into_channel_message)
            .collect()
    }

    async fn edit_message_buttons(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        buttons: &[Button],
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!("/channels/{}/messages/{}", channel_id, message_id));
        let body = EditComponentsBody {
            components: ActionRowBody::wrap(buttons),
        };

        self.execute(self.http_client.patch(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: UserId,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, PlatformError> {
        let url = self.url("/users/@me/channels");
        let body = CreateDmBody {
            recipient_id: user_id.to_string(),
        };

        let dm: ChannelObject = self
            .execute_json(self.http_client.post(&url).json(&body))
            .await?;
        self.send_message(channel_id_of(&dm)?, message).await
    }

    async fn fetch_member(&self, user_id: UserId) -> Result<Option<Member>, PlatformError> {
        let url = self.url(&format!("/guilds/{}/members/{}", self.guild_id, user_id));

        match self
            .execute_json::<MemberObject>(self.http_client.get(&url))
            .await
        {
            Ok(member) => member.into_member().map(Some),
            Err(PlatformError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
