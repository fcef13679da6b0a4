//! Rate limit gate.
//!
//! Wraps the externally owned `check_rate_limit` procedure with the
//! pipeline's failure policy: transport errors fail open, an unknown
//! receiver is skipped, and a limited answer always carries a retry time
//! in the future.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use geliom_core::types::{GroupId, UserId};
use geliom_database::store::{RateLimitQuery, RateLimitStore, RateLimitStoreError};
use geliom_entity::notification::NotificationType;

/// Decision for one (sender, receiver, group, type) tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The notification may be sent.
    Allowed,
    /// The receiver is inside the cooldown window until `wait_until`.
    Limited {
        /// Strictly after the time of the check.
        wait_until: DateTime<Utc>,
    },
    /// The receiver does not exist; drop it silently.
    Skipped,
}

impl GateOutcome {
    /// Whether the notification may go out to this receiver.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Per-receiver rate-limit check.
#[derive(Clone)]
pub struct RateLimitGate {
    store: Arc<dyn RateLimitStore>,
}

impl std::fmt::Debug for RateLimitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGate").finish_non_exhaustive()
    }
}

impl RateLimitGate {
    /// Create a gate over the given store.
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Check one receiver using the type's cooldown.
    pub async fn check(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        group_id: GroupId,
        notification_type: NotificationType,
    ) -> GateOutcome {
        self.check_at(sender_id, receiver_id, group_id, notification_type, Utc::now())
            .await
    }

    /// Check one receiver, normalising the answer against `now`.
    pub async fn check_at(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        group_id: GroupId,
        notification_type: NotificationType,
        now: DateTime<Utc>,
    ) -> GateOutcome {
        let query = RateLimitQuery::new(sender_id, receiver_id, group_id, notification_type);

        match self.store.check_rate_limit(&query).await {
            Ok(decision) if decision.can_send => GateOutcome::Allowed,
            Ok(decision) => {
                let wait_until = normalize_wait_until(
                    decision.wait_until,
                    now,
                    query.cooldown_minutes,
                );
                debug!(
                    sender = %sender_id,
                    receiver = %receiver_id,
                    notification_type = %notification_type,
                    wait_until = %wait_until,
                    "Receiver is rate limited"
                );
                GateOutcome::Limited { wait_until }
            }
            Err(RateLimitStoreError::UnknownReceiver(id)) => {
                warn!(receiver = %id, "Skipping unknown receiver");
                GateOutcome::Skipped
            }
            Err(RateLimitStoreError::Other(e)) => {
                warn!(
                    receiver = %receiver_id,
                    error = %e,
                    "Rate limit check failed, allowing send"
                );
                GateOutcome::Allowed
            }
        }
    }
}

/// A missing window end means a full cooldown; a stale one means the window
/// is about to close, so retry one second later.
fn normalize_wait_until(
    wait_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown_minutes: i32,
) -> DateTime<Utc> {
    match wait_until {
        Some(at) if at > now => at,
        Some(_) => now + Duration::seconds(1),
        None => now + Duration::minutes(i64::from(cooldown_minutes.max(1))),
    }
}
