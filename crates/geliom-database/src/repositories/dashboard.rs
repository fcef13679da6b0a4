//! Dashboard and join-request list queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use geliom_core::error::{AppError, ErrorKind};
use geliom_core::result::AppResult;
use geliom_core::types::{GroupId, JoinRequestId, UserId};
use geliom_entity::group::{DashboardData, JoinRequestView};
use geliom_entity::profile::Profile;

use crate::store::DashboardSource;

/// Full-fetch queries backing the client query cache.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    /// Create a new dashboard repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PendingRequestRow {
    id: JoinRequestId,
    group_id: GroupId,
    created_at: DateTime<Utc>,
    requester_id: UserId,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

impl From<PendingRequestRow> for JoinRequestView {
    fn from(row: PendingRequestRow) -> Self {
        Self {
            id: row.id,
            group_id: row.group_id,
            requester: Profile {
                id: row.requester_id,
                display_name: row.display_name,
                avatar_url: row.avatar_url,
            },
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl DashboardSource for DashboardRepository {
    async fn dashboard(&self, group_id: GroupId, viewer: UserId) -> AppResult<DashboardData> {
        sqlx::query_scalar::<_, Json<DashboardData>>("SELECT get_group_dashboard_data($1, $2)")
            .bind(group_id)
            .bind(viewer)
            .fetch_one(&self.pool)
            .await
            .map(|json| json.0)
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load group dashboard", e)
            })
    }

    async fn pending_join_requests(&self, group_id: GroupId) -> AppResult<Vec<JoinRequestView>> {
        let rows = sqlx::query_as::<_, PendingRequestRow>(
            "SELECT jr.id, jr.group_id, jr.created_at, p.id AS requester_id, \
                    p.display_name, p.avatar_url \
             FROM join_requests jr JOIN profiles p ON p.id = jr.user_id \
             WHERE jr.group_id = $1 AND jr.status = 'pending' \
             ORDER BY jr.created_at",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list join requests", e)
        })?;

        Ok(rows.into_iter().map(JoinRequestView::from).collect())
    }
}
