//! Notification dispatch function.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use geliom_service::DispatchError;

use crate::dto::request::SendNotificationRequest;
use crate::dto::response::SendNotificationResponse;
use crate::error::ApiError;
use crate::extractors::FunctionCaller;
use crate::state::AppState;

/// POST /functions/v1/send-notification
pub async fn send_notification(
    State(state): State<AppState>,
    _caller: FunctionCaller,
    body: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<Json<SendNotificationResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let payload = request
        .into_payload()
        .map_err(DispatchError::Validation)?;

    let report = state.dispatcher.send(payload).await?;
    Ok(Json(SendNotificationResponse::ok(report)))
}
