//! Route definitions for the Geliom HTTP API.
//!
//! The two notification functions live under `/functions/v1`, everything
//! else under `/api`. The router receives `AppState` and passes it to all
//! handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;
    let cors = build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(membership_routes())
        .merge(health_routes());

    Router::new()
        .nest("/functions/v1", function_routes())
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Notification functions
fn function_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/send-notification",
            post(handlers::notification::send_notification),
        )
        .route(
            "/process-pending-notifications",
            post(handlers::pending::process_pending_notifications),
        )
}

/// Join requests and direct invites
fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/join-requests", post(handlers::membership::request_to_join))
        .route(
            "/join-requests/{id}/respond",
            post(handlers::membership::respond_to_join_request),
        )
        .route(
            "/groups/{id}/invites",
            post(handlers::membership::invite_user),
        )
}

/// Health check (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
