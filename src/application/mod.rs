//! Application layer - Commands, Handlers and the action dispatcher.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod delivery;
pub mod dispatcher;
pub mod handlers;
pub mod messages;

pub use delivery::{DeliveryFanout, DeliveryOutcome, DeliveryStatus, Notification, RecipientTarget};
pub use dispatcher::{ActionDispatcher, TicketServices};
pub use handlers::*;
