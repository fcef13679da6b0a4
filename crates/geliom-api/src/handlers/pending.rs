//! Pending notification sweep function.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::dto::response::SweepResponse;
use crate::error::ApiError;
use crate::extractors::FunctionCaller;
use crate::state::AppState;

/// POST /functions/v1/process-pending-notifications
///
/// Any request body is ignored.
pub async fn process_pending_notifications(
    State(state): State<AppState>,
    _caller: FunctionCaller,
) -> Result<Json<SweepResponse>, ApiError> {
    let report = state.sweeper.sweep(Utc::now()).await?;
    Ok(Json(SweepResponse::from(&report)))
}
