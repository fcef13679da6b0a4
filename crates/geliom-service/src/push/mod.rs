//! Push provider seam and the OneSignal implementation.

pub mod client;
pub mod diagnosis;
pub mod request;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use geliom_core::error::AppError;
use geliom_core::types::{GroupId, UserId};
use geliom_entity::notification::NotificationType;

pub use client::OneSignalClient;

/// One outbound push addressed to every surviving recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    /// Recipients, targeted by alias.
    pub recipients: Vec<UserId>,
    /// Originating member, if any.
    pub sender_id: Option<UserId>,
    /// Group the push concerns.
    pub group_id: GroupId,
    /// Heading shown on the device.
    pub group_name: String,
    /// Title carried in the routing metadata.
    pub title: String,
    /// Body shown on the device.
    pub message: String,
    /// Notification type, for client-side routing.
    pub notification_type: NotificationType,
}

/// Provider acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushReceipt {
    /// Provider-assigned notification id.
    #[serde(default)]
    pub id: Option<String>,
    /// Provider-reported per-recipient errors, if any.
    #[serde(default)]
    pub errors: Option<Value>,
}

/// Failure to hand a push to the provider.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The provider answered with a non-success status.
    #[error("Push provider returned status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
        /// Heuristic hints for 403 responses.
        diagnosis: Option<Value>,
    },
    /// The request never produced a response.
    #[error("{0}")]
    Transport(AppError),
    /// Credentials or endpoint are unusable.
    #[error("{0}")]
    Configuration(AppError),
}

/// A push delivery provider.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Validate credentials locally, without any network call.
    fn check_credentials(&self) -> Result<(), AppError>;

    /// Post one notification. Never retried here.
    async fn deliver(&self, message: &PushMessage) -> Result<PushReceipt, PushError>;
}
