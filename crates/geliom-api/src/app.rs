//! Application builder: wires repositories, services, the sweep worker and
//! the router into a running server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_database::DatabasePool;
use geliom_database::repositories::{
    MembershipRepository, PendingNotificationRepository, RateLimitRepository, UserRepository,
};
use geliom_service::{
    MembershipService, NotificationDispatcher, OneSignalClient, PendingNotificationSweeper,
    RateLimitGate,
};
use geliom_worker::jobs::PendingNotificationJob;
use geliom_worker::{CronScheduler, JobExecutor};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Build the application state on top of the Postgres repositories.
pub fn build_state(config: AppConfig, db_pool: DatabasePool) -> AppState {
    let pool = db_pool.pool().clone();
    let users = Arc::new(UserRepository::new(pool.clone()));
    let rate_limits = Arc::new(RateLimitRepository::new(pool.clone()));
    let pending = Arc::new(PendingNotificationRepository::new(pool.clone()));
    let membership = Arc::new(MembershipRepository::new(pool));

    let push = Arc::new(OneSignalClient::new(config.push.clone()));
    let dispatcher = NotificationDispatcher::new(
        users.clone(),
        RateLimitGate::new(rate_limits),
        push,
    );
    let sweeper = Arc::new(PendingNotificationSweeper::new(
        pending,
        users,
        dispatcher.clone(),
        &config.notifications,
    ));
    let membership = MembershipService::new(membership, dispatcher.clone());

    AppState::new(config, Some(db_pool), dispatcher, sweeper, membership)
}

/// Runs the Geliom server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: DatabasePool) -> Result<(), AppError> {
    tracing::info!("Starting Geliom server...");

    if let Err(e) = config.push.validate_rest_key() {
        tracing::warn!(error = %e, "Push REST key is unusable; every dispatch will fail");
    }

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = build_state(config.clone(), db_pool.clone());

    let mut scheduler = if config.worker.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(PendingNotificationJob::new(Arc::clone(
            &state.sweeper,
        ))));

        let scheduler = CronScheduler::new(Arc::new(executor)).await?;
        scheduler.register_default_tasks(&config.worker).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    let membership = state.membership.clone();
    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "Geliom server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Waiting for background tasks to complete...");
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
        }
    }
    if tokio::time::timeout(grace, membership.drain()).await.is_err() {
        tracing::warn!(grace_seconds = grace.as_secs(), "Abandoned in-flight notifications");
    }
    db_pool.close().await;

    tracing::info!("Geliom server shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
