//! Rate-limit procedure client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use geliom_core::error::{AppError, ErrorKind};

use crate::store::{RateLimitDecision, RateLimitQuery, RateLimitStore, RateLimitStoreError};

/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Calls the `check_rate_limit` stored procedure.
#[derive(Debug, Clone)]
pub struct RateLimitRepository {
    pool: PgPool,
}

impl RateLimitRepository {
    /// Create a new rate-limit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for RateLimitRepository {
    async fn check_rate_limit(
        &self,
        query: &RateLimitQuery,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        let row: (bool, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT can_send, wait_until FROM check_rate_limit($1, $2, $3, $4, $5)",
        )
        .bind(query.sender_id)
        .bind(query.receiver_id)
        .bind(query.group_id)
        .bind(query.notification_type.as_str())
        .bind(query.cooldown_minutes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                RateLimitStoreError::UnknownReceiver(query.receiver_id)
            } else {
                RateLimitStoreError::Other(AppError::with_source(
                    ErrorKind::Database,
                    "Rate limit check failed",
                    e,
                ))
            }
        })?;

        Ok(RateLimitDecision {
            can_send: row.0,
            wait_until: row.1,
        })
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION),
        _ => false,
    }
}
