//! Transient notification payload handed to the dispatcher.

use geliom_core::types::{GroupId, UserId};
use serde::{Deserialize, Serialize};

use super::kind::NotificationType;

/// Everything needed for one push fan-out. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Intended recipients, in the order they should be checked.
    pub receiver_ids: Vec<UserId>,
    /// Originating member. System notifications have no sender and skip
    /// rate limiting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    /// Group the notification concerns.
    pub group_id: GroupId,
    /// Group display name, used as the push heading.
    pub group_name: String,
    /// Title carried in the routing metadata.
    pub title: String,
    /// Push body.
    pub message: String,
    /// Notification type.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
}

impl NotificationPayload {
    /// Check the fields a fan-out cannot proceed without.
    pub fn validate(&self) -> Result<(), String> {
        if self.receiver_ids.is_empty() {
            return Err("receiver_ids must contain at least one user".to_string());
        }
        if self.group_name.trim().is_empty() {
            return Err("group_name is required".to_string());
        }
        Ok(())
    }
}
