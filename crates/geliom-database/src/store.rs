//! Store traits the notification pipeline and realtime synchronizer are
//! written against.
//!
//! The sqlx repositories in [`crate::repositories`] implement these on top
//! of the hosted tables and stored procedures; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use geliom_core::error::AppError;
use geliom_core::types::{
    GroupId, JoinRequestId, MoodId, PendingNotificationId, StatusId, UserId,
};
use geliom_entity::group::{
    DashboardData, DirectInviteCreated, JoinRequestCreated, JoinRequestResolution,
    JoinRequestView,
};
use geliom_entity::notification::{DuePendingNotification, NotificationType};
use geliom_entity::presence::{Mood, Status};
use geliom_entity::profile::Profile;

/// Existence checks against the user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Return the members of `ids` that correspond to existing users, in
    /// input order, each listed once.
    async fn existing_users(&self, ids: &[UserId]) -> Result<Vec<UserId>, AppError>;
}

/// Arguments of one `check_rate_limit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitQuery {
    /// Originating member.
    pub sender_id: UserId,
    /// Receiver being checked.
    pub receiver_id: UserId,
    /// Group the notification concerns.
    pub group_id: GroupId,
    /// Notification type.
    pub notification_type: NotificationType,
    /// Cooldown window in minutes.
    pub cooldown_minutes: i32,
}

impl RateLimitQuery {
    /// Build a query using the type's own cooldown.
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        group_id: GroupId,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            sender_id,
            receiver_id,
            group_id,
            notification_type,
            cooldown_minutes: notification_type.cooldown_minutes(),
        }
    }
}

/// Raw answer of the rate-limit procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the send may proceed.
    pub can_send: bool,
    /// End of the current window when `can_send` is false.
    pub wait_until: Option<DateTime<Utc>>,
}

/// Failure of a rate-limit check.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitStoreError {
    /// The receiver id violated a foreign key: no such user.
    #[error("receiver {0} does not exist")]
    UnknownReceiver(UserId),
    /// Transport or any other database failure.
    #[error(transparent)]
    Other(#[from] AppError),
}

/// The externally owned rate-limit window bookkeeping.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Ask whether `query.sender_id` may notify `query.receiver_id` now.
    async fn check_rate_limit(
        &self,
        query: &RateLimitQuery,
    ) -> Result<RateLimitDecision, RateLimitStoreError>;
}

/// Access to the `pending_notifications` table.
#[async_trait]
pub trait PendingNotificationStore: Send + Sync {
    /// Rows with `scheduled_at <= now`, joined with sender, group and status.
    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<DuePendingNotification>, AppError>;

    /// Delete a row.
    async fn delete(&self, id: PendingNotificationId) -> Result<(), AppError>;

    /// Move a row's `scheduled_at` to `at`.
    async fn reschedule(
        &self,
        id: PendingNotificationId,
        at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Membership stored procedures. Authorization is enforced inside them.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// `create_join_request(actor, invite_code)`.
    async fn create_join_request(
        &self,
        actor: UserId,
        invite_code: &str,
    ) -> Result<JoinRequestCreated, AppError>;

    /// `respond_to_join_request(actor, request_id, approve)`.
    async fn respond_to_join_request(
        &self,
        actor: UserId,
        request_id: JoinRequestId,
        approve: bool,
    ) -> Result<JoinRequestResolution, AppError>;

    /// `create_direct_invite(actor, group_id, invitee)`.
    async fn create_direct_invite(
        &self,
        actor: UserId,
        group_id: GroupId,
        invitee: UserId,
    ) -> Result<DirectInviteCreated, AppError>;
}

/// Full fetches backing the client-side query cache.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// `get_group_dashboard_data(group_id)` as seen by `viewer`.
    async fn dashboard(&self, group_id: GroupId, viewer: UserId)
    -> Result<DashboardData, AppError>;

    /// Pending join requests of a group with requester profiles embedded.
    async fn pending_join_requests(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<JoinRequestView>, AppError>;
}

/// Point lookups of related entities referenced by change events.
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// A status by id.
    async fn status(&self, id: StatusId) -> Result<Option<Status>, AppError>;

    /// A mood by id.
    async fn mood(&self, id: MoodId) -> Result<Option<Mood>, AppError>;

    /// A profile by id.
    async fn profile(&self, id: UserId) -> Result<Option<Profile>, AppError>;
}
