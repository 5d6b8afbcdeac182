//! ReconcileTicketsHandler - Startup maintenance for orphaned ticket records.
//!
//! A record whose channel no longer exists, or that the bot can no longer
//! see, is purged. Channels that cannot be checked are left alone.

use std::sync::Arc;

use crate::domain::foundation::{ChannelId, DomainError};
use crate::ports::{ChatPlatform, TicketStore};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub kept: usize,
    pub purged: Vec<ChannelId>,
    /// Records that could not be checked or purged.
    pub errors: usize,
}

/// Handler for reconciling the store against the platform.
pub struct ReconcileTicketsHandler {
    store: Arc<dyn TicketStore>,
    platform: Arc<dyn ChatPlatform>,
}

impl ReconcileTicketsHandler {
    pub fn new(store: Arc<dyn TicketStore>, platform: Arc<dyn ChatPlatform>) -> Self {
        Self { store, platform }
    }

    /// Fails only when the store cannot be listed.
    pub async fn handle(&self) -> Result<ReconcileReport, DomainError> {
        let tickets = self.store.all().await?;
        let mut report = ReconcileReport {
            checked: tickets.len(),
            ..Default::default()
        };

        for ticket in tickets {
            let channel_id = ticket.channel_id();
            match self.platform.fetch_channel(channel_id).await {
                Ok(Some(channel)) if channel.viewable => report.kept += 1,
                Ok(_) => match self.store.delete(channel_id).await {
                    Ok(_) => {
                        tracing::info!(
                            channel_id = %channel_id,
                            owner_id = %ticket.owner_id(),
                            "Purged ticket with unreachable channel"
                        );
                        report.purged.push(channel_id);
                    }
                    Err(e) => {
                        tracing::warn!(
                            channel_id = %channel_id,
                            error = %e,
                            "Failed to purge ticket"
                        );
                        report.errors += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        channel_id = %channel_id,
                        error = %e,
                        "Could not check ticket channel; keeping record"
                    );
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            checked = report.checked,
            kept = report.kept,
            purged = report.purged.len(),
            errors = report.errors,
            "Ticket reconciliation finished"
        );
        Ok(report)
    }
}
