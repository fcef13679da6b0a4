//! Fan-out failure taxonomy.

use chrono::{DateTime, Utc};
use serde_json::Value;

use geliom_core::error::AppError;

/// Why a dispatch did not reach the push provider, or why the provider
/// refused it.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A required field is missing. Never retried.
    #[error("{0}")]
    Validation(String),

    /// Every receiver was unknown (or skipped by the gate).
    #[error("No valid recipients found")]
    NoValidRecipients,

    /// A 1:1 receiver is inside its cooldown window, or every broadcast
    /// receiver was. Broadcast failures carry no single retry time.
    #[error("Rate limit exceeded")]
    RateLimited {
        /// End of the blocking receiver's window.
        wait_until: Option<DateTime<Utc>>,
        /// Seconds until `wait_until`, rounded up, at least 1.
        wait_seconds: Option<i64>,
    },

    /// The provider answered with a non-success status.
    #[error("Push provider rejected the request with status {status}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
        /// Heuristic hints for 403 responses.
        diagnosis: Option<Value>,
    },

    /// Credentials or endpoint are unusable; nothing was sent.
    #[error("{0}")]
    Configuration(AppError),

    /// Transport or store failure.
    #[error("{0}")]
    Internal(AppError),
}

impl DispatchError {
    /// Build a 1:1 rate-limit error, deriving `wait_seconds` from `now`.
    pub fn rate_limited(wait_until: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::RateLimited {
            wait_until: Some(wait_until),
            wait_seconds: Some(wait_seconds(wait_until, now)),
        }
    }

    /// Rate-limit failure of a broadcast where every receiver was limited.
    pub fn all_rate_limited() -> Self {
        Self::RateLimited {
            wait_until: None,
            wait_seconds: None,
        }
    }

    /// Whether this is a rate-limit class failure.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Whole seconds from `now` until `wait_until`, rounded up, minimum 1.
pub fn wait_seconds(wait_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (wait_until - now).num_milliseconds();
    ((millis + 999) / 1000).max(1)
}
