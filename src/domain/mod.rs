//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors, state machine)
//! - `ticket` - Ticket lifecycle, policy and inbound actions

pub mod foundation;
pub mod ticket;
