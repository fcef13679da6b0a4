//! User repository implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use geliom_core::error::{AppError, ErrorKind};
use geliom_core::result::AppResult;
use geliom_core::types::UserId;

use crate::store::UserDirectory;

/// Repository over the `profiles` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn existing_users(&self, ids: &[UserId]) -> AppResult<Vec<UserId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<UserId> = sqlx::query_scalar("SELECT id FROM profiles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to look up receivers", e)
            })?;

        Ok(keep_existing(ids, &found))
    }
}

/// The members of `ids` present in `found`, in input order, each listed once.
fn keep_existing(ids: &[UserId], found: &[UserId]) -> Vec<UserId> {
    let found: HashSet<UserId> = found.iter().copied().collect();
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .copied()
        .filter(|id| found.contains(id) && seen.insert(*id))
        .collect()
}
