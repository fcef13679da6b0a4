//! Join requests and direct invites.

use chrono::{DateTime, Utc};
use geliom_core::types::{GroupId, InviteId, JoinRequestId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::profile::Profile;

/// Lifecycle of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    /// Awaiting the owner's decision.
    Pending,
    /// Owner accepted; the requester is now a member.
    Approved,
    /// Owner declined.
    Rejected,
}

impl JoinRequestStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `join_requests` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JoinRequest {
    /// Request identifier.
    pub id: JoinRequestId,
    /// Target group.
    pub group_id: GroupId,
    /// Requesting user.
    pub user_id: UserId,
    /// Current state.
    pub status: JoinRequestStatus,
    /// When the request was made.
    pub created_at: DateTime<Utc>,
}

/// A pending join request as listed to the group owner, with the
/// requester's profile embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequestView {
    /// Request identifier.
    pub id: JoinRequestId,
    /// Target group.
    pub group_id: GroupId,
    /// Requesting user's profile.
    pub requester: Profile,
    /// When the request was made.
    pub created_at: DateTime<Utc>,
}

/// Result of the `create_join_request` procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequestCreated {
    /// New request.
    pub request_id: JoinRequestId,
    /// Group the code resolved to.
    pub group_id: GroupId,
    /// Group display name.
    pub group_name: String,
    /// Owner to notify.
    pub owner_id: UserId,
    /// Requester's display name.
    #[serde(default)]
    pub requester_name: Option<String>,
}

/// Result of the `respond_to_join_request` procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequestResolution {
    /// Resolved request.
    pub request_id: JoinRequestId,
    /// Group of the request.
    pub group_id: GroupId,
    /// Group display name.
    pub group_name: String,
    /// Requester to notify.
    pub requester_id: UserId,
    /// Final state.
    pub status: JoinRequestStatus,
}

/// Result of the `create_direct_invite` procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectInviteCreated {
    /// New invite.
    pub invite_id: InviteId,
    /// Group the invite is for.
    pub group_id: GroupId,
    /// Group display name.
    pub group_name: String,
    /// Inviting member's display name.
    #[serde(default)]
    pub inviter_name: Option<String>,
}
