//! Membership service.
//!
//! Each operation calls its stored procedure and, once that has succeeded,
//! queues a notification as a best-effort background task. The returned
//! value only reflects the procedure call.

use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::info;

use geliom_core::result::AppResult;
use geliom_core::task::spawn_best_effort;
use geliom_core::types::{GroupId, JoinRequestId, UserId};
use geliom_database::store::MembershipStore;
use geliom_entity::group::{
    DirectInviteCreated, JoinRequestCreated, JoinRequestResolution, JoinRequestStatus,
};
use geliom_entity::notification::{NotificationPayload, NotificationType};

use crate::notification::NotificationDispatcher;

/// Orchestrates membership procedures and their follow-up notifications.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn MembershipStore>,
    dispatcher: NotificationDispatcher,
    tracker: TaskTracker,
}

impl std::fmt::Debug for MembershipService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipService")
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl MembershipService {
    /// Creates a new membership service.
    pub fn new(store: Arc<dyn MembershipStore>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            store,
            dispatcher,
            tracker: TaskTracker::new(),
        }
    }

    /// Ask to join the group behind `invite_code`; notifies the owner.
    pub async fn request_to_join(
        &self,
        actor: UserId,
        invite_code: &str,
    ) -> AppResult<JoinRequestCreated> {
        let created = self.store.create_join_request(actor, invite_code).await?;
        info!(
            request = %created.request_id,
            group = %created.group_id,
            "Join request created"
        );

        let requester = created.requester_name.as_deref().unwrap_or("Birisi");
        self.notify(
            "join_request_notification",
            NotificationPayload {
                receiver_ids: vec![created.owner_id],
                sender_id: Some(actor),
                group_id: created.group_id,
                group_name: created.group_name.clone(),
                title: "Katılma isteği".to_string(),
                message: format!("{requester} {} grubuna katılmak istiyor", created.group_name),
                notification_type: NotificationType::JoinRequest,
            },
        );
        Ok(created)
    }

    /// Approve or reject a join request; notifies the requester.
    pub async fn respond_to_join_request(
        &self,
        actor: UserId,
        request_id: JoinRequestId,
        approve: bool,
    ) -> AppResult<JoinRequestResolution> {
        let resolution = self
            .store
            .respond_to_join_request(actor, request_id, approve)
            .await?;
        info!(
            request = %resolution.request_id,
            status = %resolution.status,
            "Join request resolved"
        );

        let message = match resolution.status {
            JoinRequestStatus::Approved => {
                format!("{} grubuna katılma isteğin onaylandı", resolution.group_name)
            }
            _ => format!("{} grubuna katılma isteğin reddedildi", resolution.group_name),
        };
        self.notify(
            "join_request_status_notification",
            NotificationPayload {
                receiver_ids: vec![resolution.requester_id],
                sender_id: Some(actor),
                group_id: resolution.group_id,
                group_name: resolution.group_name.clone(),
                title: "Katılma isteği".to_string(),
                message,
                notification_type: NotificationType::JoinRequestStatus,
            },
        );
        Ok(resolution)
    }

    /// Invite `invitee` into `group_id` directly; notifies the invitee.
    pub async fn invite_user(
        &self,
        actor: UserId,
        group_id: GroupId,
        invitee: UserId,
    ) -> AppResult<DirectInviteCreated> {
        let invite = self
            .store
            .create_direct_invite(actor, group_id, invitee)
            .await?;
        info!(invite = %invite.invite_id, group = %group_id, "Direct invite created");

        let inviter = invite.inviter_name.as_deref().unwrap_or("Birisi");
        self.notify(
            "direct_invite_notification",
            NotificationPayload {
                receiver_ids: vec![invitee],
                sender_id: Some(actor),
                group_id,
                group_name: invite.group_name.clone(),
                title: "Grup daveti".to_string(),
                message: format!("{inviter} seni {} grubuna davet etti", invite.group_name),
                notification_type: NotificationType::DirectInvite,
            },
        );
        Ok(invite)
    }

    /// Wait for every queued notification to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn notify(&self, task: &'static str, payload: NotificationPayload) {
        let dispatcher = self.dispatcher.clone();
        let handle = spawn_best_effort(task, async move { dispatcher.send(payload).await });
        self.tracker.spawn(async move {
            let _ = handle.await;
        });
    }
}
