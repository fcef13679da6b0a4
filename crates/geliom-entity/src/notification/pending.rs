//! Deferred status-change notifications.
//!
//! Rows are created by a database trigger when a member sets a status that
//! notifies. The sweep either deletes or reschedules every row it examines.

use chrono::{DateTime, Utc};
use geliom_core::types::{GroupId, PendingNotificationId, StatusId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A due pending row joined with the sender's display name, the group name
/// and the referenced status.
///
/// The joined columns are optional because the referenced records may have
/// been deleted since the row was created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DuePendingNotification {
    /// Row identifier.
    pub id: PendingNotificationId,
    /// Member whose status changed.
    pub sender_id: UserId,
    /// Members to notify.
    pub receiver_ids: Vec<UserId>,
    /// Group the status was set in.
    pub group_id: GroupId,
    /// Status that was set.
    pub status_id: StatusId,
    /// Earliest dispatch time.
    pub scheduled_at: DateTime<Utc>,
    /// Sender's display name.
    pub sender_name: Option<String>,
    /// Group display name.
    pub group_name: Option<String>,
    /// Status text.
    pub status_text: Option<String>,
    /// Status emoji.
    pub status_emoji: Option<String>,
    /// Whether the status notifies at all.
    pub status_notifies: Option<bool>,
    /// Message template pool of the status.
    pub status_messages: Option<Vec<String>>,
}

impl DuePendingNotification {
    /// A row whose status is gone or marked silent is discarded without a send.
    pub fn notifies(&self) -> bool {
        self.status_notifies.unwrap_or(false)
    }

    /// Status label used in the `{status}` placeholder.
    pub fn status_label(&self) -> Option<String> {
        match (&self.status_emoji, &self.status_text) {
            (Some(emoji), Some(text)) if !emoji.is_empty() => Some(format!("{emoji} {text}")),
            (_, Some(text)) => Some(text.clone()),
            (Some(emoji), None) => Some(emoji.clone()),
            (None, None) => None,
        }
    }

    /// Template pool, empty when the status has none.
    pub fn templates(&self) -> &[String] {
        self.status_messages.as_deref().unwrap_or(&[])
    }
}
