//! Pending notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use geliom_core::error::{AppError, ErrorKind};
use geliom_core::result::AppResult;
use geliom_core::types::PendingNotificationId;
use geliom_entity::notification::DuePendingNotification;

use crate::store::PendingNotificationStore;

const DUE_QUERY: &str = "\
    SELECT pn.id, pn.sender_id, pn.receiver_ids, pn.group_id, pn.status_id, pn.scheduled_at, \
           p.display_name AS sender_name, g.name AS group_name, \
           s.text AS status_text, s.emoji AS status_emoji, \
           s.notifies AS status_notifies, s.messages AS status_messages \
    FROM pending_notifications pn \
    LEFT JOIN profiles p ON p.id = pn.sender_id \
    LEFT JOIN groups g ON g.id = pn.group_id \
    LEFT JOIN statuses s ON s.id = pn.status_id \
    WHERE pn.scheduled_at <= $1 \
    ORDER BY pn.scheduled_at";

/// Repository over `pending_notifications`.
#[derive(Debug, Clone)]
pub struct PendingNotificationRepository {
    pool: PgPool,
}

impl PendingNotificationRepository {
    /// Create a new pending notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingNotificationStore for PendingNotificationRepository {
    async fn due(&self, now: DateTime<Utc>) -> AppResult<Vec<DuePendingNotification>> {
        sqlx::query_as::<_, DuePendingNotification>(DUE_QUERY)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to fetch pending notifications", e)
            })
    }

    async fn delete(&self, id: PendingNotificationId) -> AppResult<()> {
        sqlx::query("DELETE FROM pending_notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete pending notification", e)
            })?;
        Ok(())
    }

    async fn reschedule(&self, id: PendingNotificationId, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE pending_notifications SET scheduled_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to reschedule pending notification",
                e,
            )
        })?;
        Ok(())
    }
}
