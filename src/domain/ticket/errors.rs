//! Ticket-specific error types.
//!
//! | Error | Side effects | Reported to |
//! |-------|--------------|-------------|
//! | PolicyDenied | none | acting user |
//! | NotATicket | none | acting user |
//! | InvalidState | none | acting user |
//! | UnknownTicketType | none | acting user |
//! | MemberNotFound | none | acting user |
//! | ProvisioningFailed | none (no store write) | acting user, with hint |
//! | DeliveryFailed | audit notice already sent | acting user |
//! | Unexpected | whatever committed before the failure | acting user (generic), logs |

use thiserror::Error;

use crate::domain::foundation::{ChannelId, DomainError, ValidationError};

use super::PolicyDenial;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("policy denied: {0}")]
    PolicyDenied(PolicyDenial),

    #[error("channel {0} is not a ticket")]
    NotATicket(ChannelId),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unknown ticket type '{0}'")]
    UnknownTicketType(String),

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("channel provisioning failed: {reason}")]
    ProvisioningFailed { reason: String, hint: String },

    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl TicketError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        TicketError::InvalidState(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        TicketError::Unexpected(message.into())
    }

    /// True for failures the user caused or can fix; false for faults that
    /// deserve an error log.
    pub fn is_expected(&self) -> bool {
        !matches!(self, TicketError::Unexpected(_))
    }

    /// Text shown to the acting user.
    pub fn user_message(&self) -> String {
        match self {
            TicketError::PolicyDenied(denial) => denial.user_message(),
            TicketError::NotATicket(_) => "⚠️ This is not a valid ticket.".to_string(),
            TicketError::InvalidState(msg) => format!("⚠️ {}", msg),
            TicketError::UnknownTicketType(_) => "❌ Unknown ticket type.".to_string(),
            TicketError::MemberNotFound(_) => "⚠️ User not found.".to_string(),
            TicketError::ProvisioningFailed { hint, .. } => {
                format!("❌ An error occurred while creating the ticket. {}", hint)
            }
            TicketError::DeliveryFailed(_) => {
                "❌ I could not send you a direct message. Please check your privacy settings."
                    .to_string()
            }
            TicketError::Unexpected(_) => "❌ An unexpected error occurred.".to_string(),
        }
    }
}

impl From<PolicyDenial> for TicketError {
    fn from(denial: PolicyDenial) -> Self {
        TicketError::PolicyDenied(denial)
    }
}

impl From<ValidationError> for TicketError {
    fn from(err: ValidationError) -> Self {
        TicketError::InvalidState(err.to_string())
    }
}

impl From<DomainError> for TicketError {
    fn from(err: DomainError) -> Self {
        TicketError::Unexpected(err.to_string())
    }
}
