//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod ticket;

pub use ticket::{
    AddParticipantCommand, AddParticipantHandler, AddParticipantResult, CloseStep,
    CloseTicketCommand, CloseTicketHandler, CloseTicketResult, DeleteTicketCommand,
    DeleteTicketHandler, OpenTicketCommand, OpenTicketHandler, OpenTicketResult,
    PrintTicketCommand, PrintTicketHandler, PrintTicketResult, ReconcileReport,
    ReconcileTicketsHandler, SaveTicketCommand, SaveTicketHandler, SaveTicketResult,
    CLOSE_GRACE_PERIOD,
};
