//! Pending-notification sweep.
//!
//! Every due row ends the sweep deleted or rescheduled strictly after the
//! sweep's start time. A row's failure never stops the sweep.
//!
//! Two overlapping sweeps may both pick up the same row; there is no row
//! claiming. Rate-limited rows are pushed back indefinitely; there is no
//! retry cap.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use geliom_core::config::NotificationsConfig;
use geliom_core::result::AppResult;
use geliom_core::types::{PendingNotificationId, UserId};
use geliom_database::store::{PendingNotificationStore, UserDirectory};
use geliom_entity::notification::{DuePendingNotification, NotificationPayload, NotificationType};

use super::composer::MessageComposer;
use super::dispatcher::NotificationDispatcher;

const FALLBACK_SENDER_NAME: &str = "Birisi";
const FALLBACK_TITLE: &str = "Durum güncellemesi";

/// Terminal (or retry) state a row reached in one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// Sent and deleted.
    Delivered,
    /// Deleted without a send.
    Discarded {
        /// Why nothing was sent.
        reason: String,
    },
    /// Rate limited; moved to `until`.
    Rescheduled {
        /// New `scheduled_at`.
        until: DateTime<Utc>,
    },
    /// Send failed for another reason; deleted.
    Dropped {
        /// Failure message.
        error: String,
    },
    /// The delete or update itself failed; the row may still be due.
    StoreFailed {
        /// Failure message.
        error: String,
    },
}

impl RowOutcome {
    /// Whether the row counts as an error in the sweep totals.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Dropped { .. } | Self::StoreFailed { .. })
    }
}

/// Outcome of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// Row identifier.
    pub id: PendingNotificationId,
    /// What happened to it.
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Totals of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Rows delivered, discarded or rescheduled.
    pub processed: usize,
    /// Rows dropped after a failure or whose store update failed.
    pub errors: usize,
    /// Rows examined.
    pub total: usize,
    /// Per-row detail.
    pub outcomes: Vec<RowReport>,
}

impl SweepReport {
    fn record(&mut self, id: PendingNotificationId, outcome: RowOutcome) {
        if outcome.is_error() {
            self.errors += 1;
        } else {
            self.processed += 1;
        }
        self.outcomes.push(RowReport { id, outcome });
    }
}

/// Processes due `pending_notifications` rows.
#[derive(Clone)]
pub struct PendingNotificationSweeper {
    store: Arc<dyn PendingNotificationStore>,
    users: Arc<dyn UserDirectory>,
    dispatcher: NotificationDispatcher,
    composer: MessageComposer,
    reschedule_delay: Duration,
}

impl std::fmt::Debug for PendingNotificationSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingNotificationSweeper")
            .field("reschedule_delay", &self.reschedule_delay)
            .finish_non_exhaustive()
    }
}

impl PendingNotificationSweeper {
    /// Create a sweeper. A non-positive reschedule delay is raised to one
    /// second so a rescheduled row always moves forward.
    pub fn new(
        store: Arc<dyn PendingNotificationStore>,
        users: Arc<dyn UserDirectory>,
        dispatcher: NotificationDispatcher,
        config: &NotificationsConfig,
    ) -> Self {
        Self {
            store,
            users,
            dispatcher,
            composer: MessageComposer::new(config.default_template.clone()),
            reschedule_delay: Duration::seconds(config.reschedule_delay_seconds.max(1)),
        }
    }

    /// Process every row due at `now`.
    ///
    /// Fails only when the due rows cannot be fetched.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let rows = self.store.due(now).await?;
        let mut report = SweepReport {
            total: rows.len(),
            ..SweepReport::default()
        };
        if rows.is_empty() {
            debug!("No pending notifications due");
            return Ok(report);
        }

        info!(due = rows.len(), "Processing pending notifications");
        for row in rows {
            let id = row.id;
            let outcome = self.process(row, now).await;
            report.record(id, outcome);
        }

        info!(
            processed = report.processed,
            errors = report.errors,
            total = report.total,
            "Pending notification sweep finished"
        );
        Ok(report)
    }

    async fn process(&self, row: DuePendingNotification, now: DateTime<Utc>) -> RowOutcome {
        if !row.notifies() {
            return self
                .delete(row.id, RowOutcome::Discarded {
                    reason: "status does not notify".into(),
                })
                .await;
        }

        let receivers = match self.users.existing_users(&row.receiver_ids).await {
            Ok(receivers) => receivers,
            Err(e) => {
                warn!(id = %row.id, error = %e, "Receiver lookup failed");
                return self
                    .delete(row.id, RowOutcome::Dropped {
                        error: e.to_string(),
                    })
                    .await;
            }
        };
        if receivers.is_empty() {
            return self
                .delete(row.id, RowOutcome::Discarded {
                    reason: "no receivers exist".into(),
                })
                .await;
        }

        let payload = self.build_payload(&row, receivers);
        match self.dispatcher.send(payload).await {
            Ok(_) => self.delete(row.id, RowOutcome::Delivered).await,
            Err(e) if e.is_rate_limit() => {
                let until = now + self.reschedule_delay;
                match self.store.reschedule(row.id, until).await {
                    Ok(()) => {
                        debug!(id = %row.id, until = %until, "Rescheduled rate-limited notification");
                        RowOutcome::Rescheduled { until }
                    }
                    Err(e) => {
                        error!(id = %row.id, error = %e, "Failed to reschedule notification");
                        RowOutcome::StoreFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                warn!(id = %row.id, error = %e, "Dropping pending notification after failed send");
                self.delete(row.id, RowOutcome::Dropped {
                    error: e.to_string(),
                })
                .await
            }
        }
    }

    fn build_payload(
        &self,
        row: &DuePendingNotification,
        receivers: Vec<UserId>,
    ) -> NotificationPayload {
        let sender_name = row
            .sender_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(FALLBACK_SENDER_NAME);
        let group_name = row.group_name.clone().unwrap_or_default();
        let status = row.status_label();

        let message = self.composer.compose(
            &mut rand::rng(),
            Some(row.templates()),
            sender_name,
            &group_name,
            status.as_deref(),
        );

        NotificationPayload {
            receiver_ids: receivers,
            sender_id: Some(row.sender_id),
            group_id: row.group_id,
            group_name,
            title: status.unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            message,
            notification_type: NotificationType::StatusUpdate,
        }
    }

    async fn delete(&self, id: PendingNotificationId, outcome: RowOutcome) -> RowOutcome {
        match self.store.delete(id).await {
            Ok(()) => outcome,
            Err(e) => {
                error!(id = %id, error = %e, "Failed to delete pending notification");
                RowOutcome::StoreFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}
