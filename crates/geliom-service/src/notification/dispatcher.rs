//! Push fan-out.
//!
//! One call validates the payload, filters unknown receivers, runs the rate
//! limit gate and posts a single provider request for everyone left.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use geliom_core::types::UserId;
use geliom_database::store::UserDirectory;
use geliom_entity::notification::NotificationPayload;

use super::error::DispatchError;
use super::gate::{GateOutcome, RateLimitGate};
use crate::push::{PushError, PushMessage, PushProvider};

/// Result of a successful fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Provider-assigned notification id.
    pub id: Option<String>,
    /// Number of receivers the push was addressed to.
    pub recipients: usize,
    /// Provider-reported per-recipient errors.
    pub errors: Option<Value>,
}

/// Sends notification payloads through the gate to the push provider.
#[derive(Clone)]
pub struct NotificationDispatcher {
    users: Arc<dyn UserDirectory>,
    gate: RateLimitGate,
    push: Arc<dyn PushProvider>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        gate: RateLimitGate,
        push: Arc<dyn PushProvider>,
    ) -> Self {
        Self { users, gate, push }
    }

    /// Fan `payload` out to its receivers.
    #[instrument(
        skip(self, payload),
        fields(
            notification_type = %payload.notification_type,
            group = %payload.group_id,
            receivers = payload.receiver_ids.len()
        )
    )]
    pub async fn send(&self, payload: NotificationPayload) -> Result<DispatchReport, DispatchError> {
        payload.validate().map_err(DispatchError::Validation)?;
        self.push
            .check_credentials()
            .map_err(DispatchError::Configuration)?;

        let valid = self
            .users
            .existing_users(&payload.receiver_ids)
            .await
            .map_err(DispatchError::Internal)?;
        if valid.is_empty() {
            warn!("None of the receivers exist");
            return Err(DispatchError::NoValidRecipients);
        }
        if valid.len() < payload.receiver_ids.len() {
            debug!(
                dropped = payload.receiver_ids.len() - valid.len(),
                "Dropped unknown receivers"
            );
        }

        let recipients = match payload.sender_id {
            Some(sender) if payload.notification_type.is_broadcast() => {
                self.gate_broadcast(sender, &payload, valid).await?
            }
            Some(sender) => self.gate_sequential(sender, &payload, valid).await?,
            None => valid,
        };

        let message = PushMessage {
            recipients,
            sender_id: payload.sender_id,
            group_id: payload.group_id,
            group_name: payload.group_name,
            title: payload.title,
            message: payload.message,
            notification_type: payload.notification_type,
        };

        let receipt = self.push.deliver(&message).await.map_err(|e| match e {
            PushError::Rejected {
                status,
                body,
                diagnosis,
            } => DispatchError::Provider {
                status,
                body,
                diagnosis,
            },
            PushError::Configuration(e) => DispatchError::Configuration(e),
            PushError::Transport(e) => DispatchError::Internal(e),
        })?;

        info!(recipients = message.recipients.len(), "Notification dispatched");
        Ok(DispatchReport {
            id: receipt.id,
            recipients: message.recipients.len(),
            errors: receipt.errors,
        })
    }

    /// Check every receiver concurrently and keep the allowed ones.
    async fn gate_broadcast(
        &self,
        sender: UserId,
        payload: &NotificationPayload,
        receivers: Vec<UserId>,
    ) -> Result<Vec<UserId>, DispatchError> {
        let checks = receivers.iter().map(|&receiver| {
            self.gate
                .check(sender, receiver, payload.group_id, payload.notification_type)
        });
        let outcomes = join_all(checks).await;

        let limited = outcomes
            .iter()
            .filter(|o| matches!(o, GateOutcome::Limited { .. }))
            .count();
        let allowed: Vec<UserId> = receivers
            .into_iter()
            .zip(outcomes)
            .filter_map(|(receiver, outcome)| outcome.is_allowed().then_some(receiver))
            .collect();

        if allowed.is_empty() {
            return Err(if limited > 0 {
                warn!(limited, "Every broadcast receiver is rate limited");
                DispatchError::all_rate_limited()
            } else {
                DispatchError::NoValidRecipients
            });
        }
        if limited > 0 {
            debug!(limited, allowed = allowed.len(), "Dropped rate-limited receivers");
        }
        Ok(allowed)
    }

    /// Check receivers in order; the first limited receiver aborts the send.
    async fn gate_sequential(
        &self,
        sender: UserId,
        payload: &NotificationPayload,
        receivers: Vec<UserId>,
    ) -> Result<Vec<UserId>, DispatchError> {
        let mut allowed = Vec::with_capacity(receivers.len());
        for receiver in receivers {
            let now = Utc::now();
            match self
                .gate
                .check_at(sender, receiver, payload.group_id, payload.notification_type, now)
                .await
            {
                GateOutcome::Allowed => allowed.push(receiver),
                GateOutcome::Skipped => {}
                GateOutcome::Limited { wait_until } => {
                    info!(receiver = %receiver, wait_until = %wait_until, "Send blocked by rate limit");
                    return Err(DispatchError::rate_limited(wait_until, now));
                }
            }
        }

        if allowed.is_empty() {
            return Err(DispatchError::NoValidRecipients);
        }
        Ok(allowed)
    }
}
