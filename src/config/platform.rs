//! Chat platform configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::foundation::{GuildId, UserId};

/// Chat platform (Discord REST) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// REST API base URL, without trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bot token sent as `Authorization: Bot <token>`
    pub bot_token: SecretString,

    /// Guild the tickets live in
    pub guild_id: GuildId,

    /// The bot's own user id; granted manage rights on every ticket channel
    pub service_user_id: UserId,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Who the workflow acts as inside the guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub guild_id: GuildId,
    pub user_id: UserId,
}

impl PlatformConfig {
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            guild_id: self.guild_id,
            user_id: self.service_user_id,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate platform configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "TICKETDESK__PLATFORM__BOT_TOKEN",
            ));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlatformConfig {
        PlatformConfig {
            api_base_url: default_api_base_url(),
            bot_token: SecretString::new("token".to_string()),
            guild_id: GuildId::new(100),
            service_user_id: UserId::new(200),
            request_timeout_secs: default_request_timeout(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
        assert_eq!(config().request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn blank_token_is_rejected() {
        let config = PlatformConfig {
            bot_token: SecretString::new("  ".to_string()),
            ..config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired(
                "TICKETDESK__PLATFORM__BOT_TOKEN"
            ))
        );
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let config = PlatformConfig {
            api_base_url: "discord.com/api".to_string(),
            ..config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidApiBaseUrl));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = PlatformConfig {
            request_timeout_secs: 0,
            ..config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn identity_pairs_guild_and_bot_user() {
        let identity = config().identity();
        assert_eq!(identity.guild_id, GuildId::new(100));
        assert_eq!(identity.user_id, UserId::new(200));
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("\"token\""));
    }
}
