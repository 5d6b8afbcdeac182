//! Delivery fan-out.
//!
//! Sends one notification to several recipients. Each recipient is tried on
//! its own, in order, and a failure never stops the rest. A bounced direct
//! message is reported to the audit channel.

use std::sync::Arc;

use crate::domain::foundation::{ChannelId, MessageId, UserId};
use crate::ports::{ChatPlatform, OutgoingMessage, PlatformError, SentMessage};

use super::messages;

/// Where a notification goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientTarget {
    Direct(UserId),
    Channel(ChannelId),
}

/// Payload for every recipient of one fan-out.
pub type Notification = OutgoingMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered { message_id: MessageId },
    Failed { cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: RecipientTarget,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered { .. })
    }

    pub fn failure_cause(&self) -> Option<&str> {
        match &self.status {
            DeliveryStatus::Failed { cause } => Some(cause),
            DeliveryStatus::Delivered { .. } => None,
        }
    }
}

/// Best-effort delivery to a list of recipients.
pub struct DeliveryFanout {
    platform: Arc<dyn ChatPlatform>,
    audit_channel_id: ChannelId,
}

impl DeliveryFanout {
    pub fn new(platform: Arc<dyn ChatPlatform>, audit_channel_id: ChannelId) -> Self {
        Self {
            platform,
            audit_channel_id,
        }
    }

    /// Deliver `notification` to each distinct recipient.
    ///
    /// Returns one outcome per distinct recipient, in first-seen order.
    pub async fn deliver(
        &self,
        recipients: &[RecipientTarget],
        notification: &Notification,
    ) -> Vec<DeliveryOutcome> {
        let mut seen = Vec::with_capacity(recipients.len());
        let mut outcomes = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            if seen.contains(recipient) {
                continue;
            }
            seen.push(*recipient);

            let status = match self.send(*recipient, notification).await {
                Ok(sent) => {
                    self.attach_download_link(&sent, notification).await;
                    DeliveryStatus::Delivered {
                        message_id: sent.id,
                    }
                }
                Err(e) => {
                    tracing::warn!(recipient = ?recipient, error = %e, "Delivery failed");
                    if let RecipientTarget::Direct(user_id) = recipient {
                        self.report_bounce(*user_id, &e).await;
                    }
                    DeliveryStatus::Failed {
                        cause: e.to_string(),
                    }
                }
            };

            outcomes.push(DeliveryOutcome {
                recipient: *recipient,
                status,
            });
        }

        outcomes
    }

    async fn send(
        &self,
        recipient: RecipientTarget,
        notification: &Notification,
    ) -> Result<SentMessage, PlatformError> {
        match recipient {
            RecipientTarget::Direct(user_id) => {
                self.platform
                    .send_direct_message(user_id, notification)
                    .await
            }
            RecipientTarget::Channel(channel_id) => {
                self.platform.send_message(channel_id, notification).await
            }
        }
    }

    /// Add a link button pointing at the uploaded attachment.
    async fn attach_download_link(&self, sent: &SentMessage, notification: &Notification) {
        let Some(url) = sent.attachment_urls.first() else {
            return;
        };
        let mut buttons = notification.buttons.clone();
        buttons.push(messages::download_button(url.clone()));

        if let Err(e) = self
            .platform
            .edit_message_buttons(sent.channel_id, sent.id, &buttons)
            .await
        {
            tracing::warn!(
                channel_id = %sent.channel_id,
                message_id = %sent.id,
                error = %e,
                "Failed to add transcript download link"
            );
        }
    }

    async fn report_bounce(&self, user_id: UserId, error: &PlatformError) {
        let notice = messages::delivery_failure_notice(user_id, &error.to_string());
        if let Err(e) = self
            .platform
            .send_message(self.audit_channel_id, &notice)
            .await
        {
            tracing::error!(
                user_id = %user_id,
                audit_channel_id = %self.audit_channel_id,
                error = %e,
                "Failed to post delivery failure notice"
            );
        }
    }
}
