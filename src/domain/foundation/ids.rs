//! Strongly-typed identifier value objects.
//!
//! Every entity on the chat platform is addressed by a snowflake: a `u64`
//! that is transported as a decimal string. Each kind of entity gets its own
//! newtype so a channel id can never be passed where a user id is expected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw snowflake.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw snowflake.
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_snowflake(stringify!($name), s).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = SnowflakeRepr::deserialize(deserializer)?;
                match raw {
                    SnowflakeRepr::Number(n) => Ok(Self(n)),
                    SnowflakeRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

/// Snowflakes arrive as strings from the REST API but as integers from
/// hand-written config files; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnowflakeRepr {
    Number(u64),
    Text(String),
}

fn parse_snowflake(kind: &str, s: &str) -> Result<u64, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field(kind));
    }
    match trimmed.parse::<u64>() {
        Ok(0) => Err(ValidationError::invalid_format(kind, "snowflake cannot be zero")),
        Ok(raw) => Ok(raw),
        Err(_) => Err(ValidationError::invalid_format(
            kind,
            format!("'{}' is not a numeric snowflake", trimmed),
        )),
    }
}

snowflake_id!(
    /// The guild (server) the tickets live in. Its id doubles as the id of
    /// the implicit `@everyone` role.
    GuildId
);
snowflake_id!(
    /// A text channel. Primary key of a ticket.
    ChannelId
);
snowflake_id!(
    /// A channel category that ticket channels are created under.
    CategoryId
);
snowflake_id!(
    /// A platform user (ticket owner, participant, actor or the bot itself).
    UserId
);
snowflake_id!(
    /// A guild role.
    RoleId
);
snowflake_id!(
    /// A message inside a channel.
    MessageId
);

impl GuildId {
    /// The `@everyone` role shares its id with the guild.
    pub fn everyone_role(&self) -> RoleId {
        RoleId(self.0)
    }
}
