//! Point lookups for statuses, moods and profiles.

use async_trait::async_trait;
use sqlx::PgPool;

use geliom_core::error::{AppError, ErrorKind};
use geliom_core::result::AppResult;
use geliom_core::types::{MoodId, StatusId, UserId};
use geliom_entity::presence::{Mood, Status};
use geliom_entity::profile::Profile;

use crate::store::LookupSource;

/// Single-row lookups used when a change event references an entity that
/// is not embedded in the cached query.
#[derive(Debug, Clone)]
pub struct LookupRepository {
    pool: PgPool,
}

impl LookupRepository {
    /// Create a new lookup repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupSource for LookupRepository {
    async fn status(&self, id: StatusId) -> AppResult<Option<Status>> {
        sqlx::query_as::<_, Status>(
            "SELECT id, text, emoji, notifies, messages FROM statuses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up status", e))
    }

    async fn mood(&self, id: MoodId) -> AppResult<Option<Mood>> {
        sqlx::query_as::<_, Mood>("SELECT id, text, emoji FROM moods WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up mood", e))
    }

    async fn profile(&self, id: UserId) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(
            "SELECT id, display_name, avatar_url FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up profile", e))
    }
}
