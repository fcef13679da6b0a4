//! Membership handlers. Each one calls its procedure as the authenticated
//! user; the follow-up notification runs in the background.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use geliom_core::types::{GroupId, JoinRequestId};
use geliom_entity::group::{DirectInviteCreated, JoinRequestCreated, JoinRequestResolution};

use crate::dto::request::{DirectInviteBody, JoinRequestBody, RespondToJoinRequestBody};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/join-requests
pub async fn request_to_join(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<JoinRequestBody>,
) -> Result<(StatusCode, Json<JoinRequestCreated>), ApiError> {
    let created = state
        .membership
        .request_to_join(user.id(), body.invite_code.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/join-requests/{id}/respond
pub async fn respond_to_join_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(request_id): Path<JoinRequestId>,
    Json(body): Json<RespondToJoinRequestBody>,
) -> Result<Json<JoinRequestResolution>, ApiError> {
    let resolution = state
        .membership
        .respond_to_join_request(user.id(), request_id, body.approve)
        .await?;
    Ok(Json(resolution))
}

/// POST /api/groups/{id}/invites
pub async fn invite_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(body): Json<DirectInviteBody>,
) -> Result<(StatusCode, Json<DirectInviteCreated>), ApiError> {
    let invite = state
        .membership
        .invite_user(user.id(), group_id, body.invitee_id)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}
