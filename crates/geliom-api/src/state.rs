//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use geliom_core::config::AppConfig;
use geliom_database::DatabasePool;
use geliom_service::{MembershipService, NotificationDispatcher, PendingNotificationSweeper};

use crate::extractors::auth::TokenVerifier;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL pool, used by the health check. Absent when the state is
    /// wired against in-memory stores.
    pub db_pool: Option<DatabasePool>,
    /// Bearer token verifier for the membership routes
    pub tokens: Arc<TokenVerifier>,
    /// Push fan-out
    pub dispatcher: NotificationDispatcher,
    /// Pending notification sweep
    pub sweeper: Arc<PendingNotificationSweeper>,
    /// Membership procedures and their notifications
    pub membership: MembershipService,
}

impl AppState {
    /// Assemble a state from already-built services.
    pub fn new(
        config: AppConfig,
        db_pool: Option<DatabasePool>,
        dispatcher: NotificationDispatcher,
        sweeper: Arc<PendingNotificationSweeper>,
        membership: MembershipService,
    ) -> Self {
        let tokens = Arc::new(TokenVerifier::new(&config.auth));
        Self {
            config: Arc::new(config),
            db_pool,
            tokens,
            dispatcher,
            sweeper,
            membership,
        }
    }
}
