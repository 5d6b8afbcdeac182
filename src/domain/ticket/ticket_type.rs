//! Configured ticket categories.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CategoryId, RoleId, ValidationError};

/// A category of ticket users can pick from the menu.
///
/// Read-only at runtime. Decides where the channel is created and which
/// extra role can see it; nothing about the type is stored on the ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Category the ticket channel is created under.
    pub category_id: CategoryId,

    /// Unicode emoji or custom emoji markup (`<:name:id>`).
    #[serde(default)]
    pub emoji: Option<String>,

    /// Role granted view and send on tickets of this type.
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

impl TicketType {
    /// Menu value for this type: lowercase name, whitespace runs become `_`.
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Id of a custom emoji, if `emoji` uses the `<:name:id>` or
    /// `<a:name:id>` form.
    pub fn custom_emoji_id(&self) -> Option<u64> {
        let emoji = self.emoji.as_deref()?;
        let inner = emoji.strip_prefix('<')?.strip_suffix('>')?;
        let mut parts = inner.split(':');
        let flag = parts.next()?;
        if !flag.is_empty() && flag != "a" {
            return None;
        }
        let name = parts.next()?;
        let id = parts.next()?;
        if parts.next().is_some()
            || name.is_empty()
            || !name.chars().all(|c| c.is_alphanumeric() || c == '_')
        {
            return None;
        }
        id.parse().ok()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("ticket_type.name"));
        }
        if let Some(emoji) = &self.emoji {
            if emoji.starts_with('<') && self.custom_emoji_id().is_none() {
                return Err(ValidationError::invalid_format(
                    "ticket_type.emoji",
                    format!("'{}' is not valid custom emoji markup", emoji),
                ));
            }
        }
        Ok(())
    }
}

/// Find the type whose slug matches a menu selection.
pub fn find_by_slug<'a>(types: &'a [TicketType], slug: &str) -> Option<&'a TicketType> {
    types.iter().find(|t| t.slug() == slug)
}
