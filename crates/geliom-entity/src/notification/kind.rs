//! Notification type enumeration and per-type cooldowns.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of push notification. Determines the rate-limit cooldown and
/// whether recipients are checked as a broadcast or one by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Someone asked to join a group the recipient owns.
    JoinRequest,
    /// The recipient's join request was approved or rejected.
    JoinRequestStatus,
    /// The recipient was invited into a group directly.
    DirectInvite,
    /// A group member changed their status.
    StatusUpdate,
    /// A group member changed their mood.
    MoodUpdate,
    /// A scheduled reminder for a group event.
    EventReminder,
}

impl NotificationType {
    /// All notification types.
    pub const ALL: [NotificationType; 6] = [
        Self::JoinRequest,
        Self::JoinRequestStatus,
        Self::DirectInvite,
        Self::StatusUpdate,
        Self::MoodUpdate,
        Self::EventReminder,
    ];

    /// Return the wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JoinRequest => "join_request",
            Self::JoinRequestStatus => "join_request_status",
            Self::DirectInvite => "direct_invite",
            Self::StatusUpdate => "status_update",
            Self::MoodUpdate => "mood_update",
            Self::EventReminder => "event_reminder",
        }
    }

    /// Minimum minutes between two notifications of this type from the same
    /// sender to the same receiver in the same group.
    pub fn cooldown_minutes(&self) -> i32 {
        match self {
            Self::JoinRequest => 5,
            Self::JoinRequestStatus => 1,
            Self::DirectInvite => 10,
            Self::StatusUpdate => 1,
            Self::MoodUpdate => 1,
            Self::EventReminder => 60,
        }
    }

    /// Broadcast types go to a whole group at once; a limited receiver is
    /// dropped instead of failing the send.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::StatusUpdate | Self::MoodUpdate)
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown notification type '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldowns() {
        assert_eq!(NotificationType::JoinRequest.cooldown_minutes(), 5);
        assert_eq!(NotificationType::JoinRequestStatus.cooldown_minutes(), 1);
        assert_eq!(NotificationType::DirectInvite.cooldown_minutes(), 10);
        assert_eq!(NotificationType::StatusUpdate.cooldown_minutes(), 1);
        assert_eq!(NotificationType::MoodUpdate.cooldown_minutes(), 1);
        assert_eq!(NotificationType::EventReminder.cooldown_minutes(), 60);
    }

    #[test]
    fn test_only_status_and_mood_are_broadcast() {
        let broadcast: Vec<_> = NotificationType::ALL
            .into_iter()
            .filter(NotificationType::is_broadcast)
            .collect();
        assert_eq!(
            broadcast,
            vec![NotificationType::StatusUpdate, NotificationType::MoodUpdate]
        );
    }

    #[test]
    fn test_wire_names_match_serde() {
        for kind in NotificationType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<NotificationType>().unwrap(), kind);
        }
    }
}
