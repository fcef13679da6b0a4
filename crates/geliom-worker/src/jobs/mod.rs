//! Built-in job handlers.

pub mod pending_notification;

pub use pending_notification::{PENDING_NOTIFICATION_SWEEP, PendingNotificationJob};
