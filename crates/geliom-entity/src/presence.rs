//! Presence signals: statuses, moods and per-group nicknames.
//!
//! `Status` and `Mood` are catalogue rows. `UserStatus`, `UserMood` and
//! `GroupNickname` are the per-member rows that change at runtime and are
//! delivered through the realtime change feed.

use chrono::{DateTime, Utc};
use geliom_core::types::{GroupId, MoodId, StatusId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An activity a member can set ("Yolda", "Uyuyor").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Status {
    /// Status identifier.
    pub id: StatusId,
    /// Display text.
    pub text: String,
    /// Optional emoji.
    pub emoji: Option<String>,
    /// Whether setting this status notifies the group.
    #[serde(default)]
    pub notifies: bool,
    /// Message template pool used when notifying.
    #[serde(default)]
    pub messages: Option<Vec<String>>,
}

/// An emotion a member can set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Mood {
    /// Mood identifier.
    pub id: MoodId,
    /// Display text.
    pub text: String,
    /// Optional emoji.
    pub emoji: Option<String>,
}

/// A member's current status. `group_id` is null for a global status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserStatus {
    /// Member.
    pub user_id: UserId,
    /// Scope of the status, `None` when visible in every group.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Selected status.
    pub status_id: StatusId,
    /// Embedded status details, present when the feed joined them in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub status: Option<Status>,
    /// Last change.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A member's current mood. `group_id` is null for a global mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserMood {
    /// Member.
    pub user_id: UserId,
    /// Scope of the mood, `None` when visible in every group.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Selected mood.
    pub mood_id: MoodId,
    /// Embedded mood details, present when the feed joined them in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub mood: Option<Mood>,
    /// Last change.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The name a member goes by inside one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GroupNickname {
    /// Member.
    pub user_id: UserId,
    /// Group the nickname applies to.
    pub group_id: GroupId,
    /// Nickname text.
    pub nickname: String,
}
