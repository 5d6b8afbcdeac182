//! Ticketdesk - Support-ticket lifecycle engine for chat platforms
//!
//! Members pick a ticket type and get a private channel shared with support
//! staff. Tickets can be shared with more members, closed with a transcript
//! delivered to everyone involved and an audit channel, then saved or
//! deleted by an administrator.
//!
//! Layout follows ports and adapters: `domain` holds the pure rules,
//! `ports` the contracts, `adapters` the Postgres, REST and in-memory
//! implementations, and `application` the handlers behind `ActionDispatcher`.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
