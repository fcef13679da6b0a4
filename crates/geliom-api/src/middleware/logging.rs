//! Request/response logging middleware.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

use crate::state::AppState;

/// Logs request method, path, status, and duration.
///
/// Requests slower than the push provider timeout are logged at `warn`.
pub async fn request_logging(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();
    let slow_after = state.config.push.request_timeout_seconds.saturating_mul(1000);

    if duration.as_millis() > u128::from(slow_after) {
        warn!(%method, %path, status, duration_ms = %duration.as_millis(), "Slow HTTP request");
    } else {
        info!(%method, %path, status, duration_ms = %duration.as_millis(), "HTTP request");
    }

    response
}
