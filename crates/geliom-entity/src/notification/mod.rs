//! Notification domain entities.

pub mod kind;
pub mod payload;
pub mod pending;

pub use kind::NotificationType;
pub use payload::NotificationPayload;
pub use pending::DuePendingNotification;
