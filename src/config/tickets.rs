//! Ticketing configuration
//!
//! Immutable after load; handlers share it behind an `Arc`.

use serde::Deserialize;
use std::collections::HashSet;

use super::error::ValidationError;
use crate::domain::foundation::{ChannelId, RoleId};
use crate::domain::ticket::{find_by_slug, Actor, TicketType};

/// Ticket workflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TicketingConfig {
    /// Role whose holders may save and delete any ticket. When unset nobody
    /// holds admin rights.
    #[serde(default)]
    pub admin_role_id: Option<RoleId>,

    /// Channel receiving closure transcripts and delivery-failure notices
    pub audit_channel_id: ChannelId,

    /// Categories offered in the ticket menu
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
}

impl TicketingConfig {
    pub fn find_type(&self, slug: &str) -> Option<&TicketType> {
        find_by_slug(&self.ticket_types, slug)
    }

    pub fn is_admin(&self, actor: &Actor) -> bool {
        actor.holds(self.admin_role_id)
    }

    /// Validate ticketing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ticket_types.is_empty() {
            return Err(ValidationError::NoTicketTypes);
        }

        let mut seen = HashSet::new();
        for ticket_type in &self.ticket_types {
            ticket_type
                .validate()
                .map_err(|e| ValidationError::InvalidTicketType {
                    name: ticket_type.name.clone(),
                    reason: e.to_string(),
                })?;
            let slug = ticket_type.slug();
            if !seen.insert(slug.clone()) {
                return Err(ValidationError::DuplicateTicketType(slug));
            }
        }
        Ok(())
    }
}
