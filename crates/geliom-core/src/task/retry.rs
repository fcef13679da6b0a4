//! Bounded retry with a fixed delay.
//!
//! Replaces ad hoc "poll until it looks ready" loops: the caller supplies a
//! check and a policy and gets back a definite outcome.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// How many times to check and how long to wait between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (values below 1 are treated as 1).
    pub max_attempts: u32,
    /// Pause between two consecutive checks.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Result of [`retry_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The check produced a value on attempt `attempts`.
    Satisfied { value: T, attempts: u32 },
    /// Every attempt was used without the check succeeding.
    Exhausted { attempts: u32 },
}

impl<T> RetryOutcome<T> {
    /// Convert into a result, naming the awaited condition in the error.
    pub fn into_result(self, waiting_for: &str) -> Result<T, AppError> {
        match self {
            Self::Satisfied { value, .. } => Ok(value),
            Self::Exhausted { attempts } => Err(AppError::service_unavailable(format!(
                "Gave up waiting for {waiting_for} after {attempts} attempts"
            ))),
        }
    }
}

/// Call `check` until it returns `Some`, at most `policy.max_attempts` times.
///
/// The check receives the 1-based attempt number. No delay follows the
/// final attempt.
pub async fn retry_until<T, F, Fut>(policy: RetryPolicy, mut check: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if let Some(value) = check(attempt).await {
            return RetryOutcome::Satisfied {
                value,
                attempts: attempt,
            };
        }
        if attempt < max_attempts {
            tracing::debug!(attempt, max_attempts, "Check not satisfied, retrying");
            tokio::time::sleep(policy.delay).await;
        }
    }

    RetryOutcome::Exhausted {
        attempts: max_attempts,
    }
}
