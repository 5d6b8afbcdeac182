//! Inbound action events.
//!
//! The platform layer turns menu selections, button presses and form
//! submissions into an [`ActionEvent`]. Routing is a closed set of
//! variants, matched exhaustively by the dispatcher.

use crate::domain::foundation::{ChannelId, MessageId, RoleId, UserId};

/// Component custom ids understood by the ticket workflow.
pub mod custom_id {
    pub const SELECT_TICKET_TYPE: &str = "select_ticket_type";
    pub const CLOSE_TICKET: &str = "close_ticket";
    pub const DELETE_TICKET: &str = "delete_ticket";
    pub const SAVE_TICKET: &str = "save_ticket";
    pub const ADD_USER: &str = "add_user";
    pub const PRINT_TICKET: &str = "print_ticket";
    pub const ADD_USER_MODAL: &str = "add_user_modal";

    /// Form field holding the user id to add.
    pub const FIELD_USER_ID: &str = "user_id";
    /// Form field holding the reason for adding.
    pub const FIELD_REASON: &str = "reason";
}

/// The user behind an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    /// Display tag used in closure summaries and notices.
    pub tag: String,
    /// Guild roles the actor holds at the time of the action.
    pub role_ids: Vec<RoleId>,
}

impl Actor {
    pub fn new(id: UserId, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into(),
            role_ids: Vec::new(),
        }
    }

    pub fn with_roles(mut self, role_ids: Vec<RoleId>) -> Self {
        self.role_ids = role_ids;
        self
    }

    /// Whether the actor holds `admin_role`. False when no admin role is
    /// configured.
    pub fn holds(&self, admin_role: Option<RoleId>) -> bool {
        admin_role.is_some_and(|role| self.role_ids.contains(&role))
    }
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// A ticket type was picked from the menu; `value` is the type slug.
    SelectTicketType { value: String },
    CloseTicket,
    DeleteTicket,
    SaveTicket,
    /// Request for the add-participant form.
    AddUser,
    PrintTicket,
    /// The add-participant form was submitted.
    AddParticipantSubmitted { target: String, reason: String },
}

impl ActionKind {
    /// Build from a menu or button interaction.
    ///
    /// Returns `None` for components that do not belong to the workflow.
    pub fn from_component(custom_id: &str, values: &[String]) -> Option<Self> {
        let kind = match custom_id {
            custom_id::SELECT_TICKET_TYPE => ActionKind::SelectTicketType {
                value: values.first()?.clone(),
            },
            custom_id::CLOSE_TICKET => ActionKind::CloseTicket,
            custom_id::DELETE_TICKET => ActionKind::DeleteTicket,
            custom_id::SAVE_TICKET => ActionKind::SaveTicket,
            custom_id::ADD_USER => ActionKind::AddUser,
            custom_id::PRINT_TICKET => ActionKind::PrintTicket,
            _ => return None,
        };
        Some(kind)
    }

    /// Build from a form submission given as `(field id, value)` pairs.
    pub fn from_form<'a>(
        custom_id: &str,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Option<Self> {
        if custom_id != custom_id::ADD_USER_MODAL {
            return None;
        }
        let mut target = None;
        let mut reason = None;
        for (field, value) in fields {
            match field {
                custom_id::FIELD_USER_ID => target = Some(value.trim().to_string()),
                custom_id::FIELD_REASON => reason = Some(value.trim().to_string()),
                _ => {}
            }
        }
        Some(ActionKind::AddParticipantSubmitted {
            target: target?,
            reason: reason.unwrap_or_default(),
        })
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::SelectTicketType { .. } => "select_ticket_type",
            ActionKind::CloseTicket => "close_ticket",
            ActionKind::DeleteTicket => "delete_ticket",
            ActionKind::SaveTicket => "save_ticket",
            ActionKind::AddUser => "add_user",
            ActionKind::PrintTicket => "print_ticket",
            ActionKind::AddParticipantSubmitted { .. } => "add_user_modal",
        }
    }
}

/// One inbound user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub actor: Actor,
    /// Channel the interaction happened in.
    pub channel_id: ChannelId,
    /// Message carrying the component that was pressed, if any.
    pub source_message_id: Option<MessageId>,
    pub kind: ActionKind,
}

impl ActionEvent {
    pub fn new(actor: Actor, channel_id: ChannelId, kind: ActionKind) -> Self {
        Self {
            actor,
            channel_id,
            source_message_id: None,
            kind,
        }
    }

    pub fn with_source_message(mut self, message_id: MessageId) -> Self {
        self.source_message_id = Some(message_id);
        self
    }
}

/// What the platform layer should show the acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResponse {
    /// Ephemeral reply text.
    Message(String),
    /// Open the add-participant form.
    ShowAddParticipantForm,
}

impl ActionResponse {
    pub fn message(text: impl Into<String>) -> Self {
        ActionResponse::Message(text.into())
    }
}
