//! Group dashboard view returned by `get_group_dashboard_data`.

use chrono::{DateTime, Utc};
use geliom_core::types::{GroupId, MoodId, StatusId, UserId};
use serde::{Deserialize, Serialize};

use crate::presence::{Mood, Status};

/// Group header shown above the member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Owner of the group.
    pub owner_id: UserId,
    /// Code other users join with.
    #[serde(default)]
    pub invite_code: Option<String>,
}

/// Status shown next to a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStatus {
    /// Status identifier.
    pub status_id: StatusId,
    /// Display text.
    pub text: String,
    /// Optional emoji.
    #[serde(default)]
    pub emoji: Option<String>,
    /// When the member set it.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemberStatus {
    /// Build from a catalogue status.
    pub fn from_status(status: &Status, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            status_id: status.id,
            text: status.text.clone(),
            emoji: status.emoji.clone(),
            updated_at,
        }
    }
}

/// Mood shown next to a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberMood {
    /// Mood identifier.
    pub mood_id: MoodId,
    /// Display text.
    pub text: String,
    /// Optional emoji.
    #[serde(default)]
    pub emoji: Option<String>,
    /// When the member set it.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemberMood {
    /// Build from a catalogue mood.
    pub fn from_mood(mood: &Mood, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            mood_id: mood.id,
            text: mood.text.clone(),
            emoji: mood.emoji.clone(),
            updated_at,
        }
    }
}

/// One member row of a group dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMember {
    /// Member.
    pub user_id: UserId,
    /// Profile display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Group-specific nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Current status.
    #[serde(default)]
    pub status: Option<MemberStatus>,
    /// Current mood.
    #[serde(default)]
    pub mood: Option<MemberMood>,
}

impl DashboardMember {
    /// Name to render: nickname first, then display name.
    pub fn label(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or("?")
    }
}

/// Full dashboard of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// Group header.
    pub group: GroupSummary,
    /// Members in server order.
    #[serde(default)]
    pub members: Vec<DashboardMember>,
}

impl DashboardData {
    /// Mutable access to a member, if present.
    pub fn member_mut(&mut self, user_id: UserId) -> Option<&mut DashboardMember> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    /// Shared access to a member, if present.
    pub fn member(&self, user_id: UserId) -> Option<&DashboardMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}
