//! Membership stored procedure client.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use geliom_core::error::{AppError, ErrorKind};
use geliom_core::result::AppResult;
use geliom_core::types::{GroupId, JoinRequestId, UserId};
use geliom_entity::group::{DirectInviteCreated, JoinRequestCreated, JoinRequestResolution};

use crate::store::MembershipStore;

/// Calls the join-request and invite procedures. Each returns a single JSON
/// document.
#[derive(Debug, Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    /// Create a new membership repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for MembershipRepository {
    async fn create_join_request(
        &self,
        actor: UserId,
        invite_code: &str,
    ) -> AppResult<JoinRequestCreated> {
        sqlx::query_scalar::<_, Json<JoinRequestCreated>>("SELECT create_join_request($1, $2)")
            .bind(actor)
            .bind(invite_code)
            .fetch_one(&self.pool)
            .await
            .map(|json| json.0)
            .map_err(|e| map_procedure_error("create_join_request", e))
    }

    async fn respond_to_join_request(
        &self,
        actor: UserId,
        request_id: JoinRequestId,
        approve: bool,
    ) -> AppResult<JoinRequestResolution> {
        sqlx::query_scalar::<_, Json<JoinRequestResolution>>(
            "SELECT respond_to_join_request($1, $2, $3)",
        )
        .bind(actor)
        .bind(request_id)
        .bind(approve)
        .fetch_one(&self.pool)
        .await
        .map(|json| json.0)
        .map_err(|e| map_procedure_error("respond_to_join_request", e))
    }

    async fn create_direct_invite(
        &self,
        actor: UserId,
        group_id: GroupId,
        invitee: UserId,
    ) -> AppResult<DirectInviteCreated> {
        sqlx::query_scalar::<_, Json<DirectInviteCreated>>(
            "SELECT create_direct_invite($1, $2, $3)",
        )
        .bind(actor)
        .bind(group_id)
        .bind(invitee)
        .fetch_one(&self.pool)
        .await
        .map(|json| json.0)
        .map_err(|e| map_procedure_error("create_direct_invite", e))
    }
}

/// Translate a procedure failure into an application error.
///
/// Business rule violations are raised by the procedures with
/// `RAISE EXCEPTION` (`P0001`) and surface as validation errors carrying the
/// procedure's message.
fn map_procedure_error(procedure: &'static str, err: sqlx::Error) -> AppError {
    let (code, message) = match &err {
        sqlx::Error::Database(db) => (
            db.code().map(|c| c.into_owned()),
            db.message().to_string(),
        ),
        _ => (None, err.to_string()),
    };

    match code.as_deref() {
        Some("P0001") => AppError::validation(message),
        Some("42501") => AppError::authorization(message),
        Some("23505") => AppError::conflict(message),
        Some("23503") => AppError::not_found(message),
        _ => AppError::with_source(
            ErrorKind::Database,
            format!("Procedure {procedure} failed"),
            err,
        ),
    }
}
