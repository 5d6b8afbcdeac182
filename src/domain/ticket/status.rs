//! TicketStatus enum for tracking the lifecycle of a ticket.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a ticket.
///
/// Only `Open` and `Closed` are persisted. `Closing` is claimed in memory by
/// the close handler while its sequence runs. `Saved` is read back from the
/// channel's saved marker; `Deleted` means the channel is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Closing,
    Closed,
    Saved,
    Deleted,
}

impl StateMachine for TicketStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TicketStatus::*;
        matches!(
            (self, target),
            (Open, Open) | (Open, Closing) | (Closing, Closed) | (Closed, Saved) | (Closed, Deleted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TicketStatus::*;
        match self {
            Open => vec![Open, Closing],
            Closing => vec![Closed],
            Closed => vec![Saved, Deleted],
            Saved | Deleted => vec![],
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketStatus::Open => "open",
            TicketStatus::Closing => "closing",
            TicketStatus::Closed => "closed",
            TicketStatus::Saved => "saved",
            TicketStatus::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}
