//! Request DTOs.

use serde::{Deserialize, Serialize};

use geliom_core::types::{GroupId, UserId};
use geliom_entity::notification::{NotificationPayload, NotificationType};

/// Body of the send-notification function.
///
/// Every field is optional on the wire so a missing one is reported as a
/// validation failure instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub receiver_ids: Option<Vec<UserId>>,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub notification_type: Option<NotificationType>,
}

impl SendNotificationRequest {
    /// Convert into a payload, naming every missing field.
    pub fn into_payload(self) -> Result<NotificationPayload, String> {
        let mut missing = Vec::new();
        if self.receiver_ids.as_ref().is_none_or(|ids| ids.is_empty()) {
            missing.push("receiver_ids");
        }
        if self.group_id.is_none() {
            missing.push("group_id");
        }
        if self.group_name.as_deref().is_none_or(|s| s.trim().is_empty()) {
            missing.push("group_name");
        }
        if self.title.is_none() {
            missing.push("title");
        }
        if self.message.is_none() {
            missing.push("message");
        }
        if self.notification_type.is_none() {
            missing.push("type");
        }

        match (
            self.receiver_ids,
            self.group_id,
            self.group_name,
            self.title,
            self.message,
            self.notification_type,
        ) {
            (
                Some(receiver_ids),
                Some(group_id),
                Some(group_name),
                Some(title),
                Some(message),
                Some(notification_type),
            ) if missing.is_empty() => Ok(NotificationPayload {
                receiver_ids,
                sender_id: self.sender_id,
                group_id,
                group_name,
                title,
                message,
                notification_type,
            }),
            _ => Err(format!("Missing required fields: {}", missing.join(", "))),
        }
    }
}

/// Body of `POST /api/join-requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequestBody {
    /// Group invite code.
    pub invite_code: String,
}

/// Body of `POST /api/join-requests/{id}/respond`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondToJoinRequestBody {
    /// Approve (`true`) or reject (`false`).
    pub approve: bool,
}

/// Body of `POST /api/groups/{id}/invites`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectInviteBody {
    pub invitee_id: UserId,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_complete_body_converts() {
        let receiver = UserId::new();
        let request: SendNotificationRequest = serde_json::from_value(json!({
            "receiver_ids": [receiver],
            "group_id": GroupId::new(),
            "group_name": "Aile",
            "title": "Durum",
            "message": "Evde",
            "type": "status_update",
        }))
        .unwrap();

        let payload = request.into_payload().unwrap();
        assert_eq!(payload.receiver_ids, vec![receiver]);
        assert_eq!(payload.sender_id, None);
        assert_eq!(payload.notification_type, NotificationType::StatusUpdate);
    }

    #[test]
    fn test_missing_fields_are_named() {
        let request: SendNotificationRequest = serde_json::from_value(json!({
            "receiver_ids": [],
            "group_name": "Aile",
            "title": "Durum",
            "message": "Evde",
        }))
        .unwrap();

        let err = request.into_payload().unwrap_err();
        assert_eq!(err, "Missing required fields: receiver_ids, group_id, type");
    }
}
