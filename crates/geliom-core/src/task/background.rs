//! Best-effort background tasks.
//!
//! Secondary side effects (for example the notification that follows a
//! successful join request) run detached from the primary operation. The
//! primary result never observes their outcome; failures and panics are
//! logged and go no further.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;

/// Spawn `fut` with its own error boundary.
///
/// The returned handle resolves once the task has finished and its outcome
/// has been logged. Dropping the handle does not cancel the task.
pub fn spawn_best_effort<F, T, E>(task: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let inner = tokio::spawn(fut);
    tokio::spawn(async move {
        match inner.await {
            Ok(Ok(_)) => tracing::debug!(task, "Background task completed"),
            Ok(Err(e)) => tracing::warn!(task, error = %e, "Background task failed"),
            Err(join_err) if join_err.is_panic() => {
                tracing::error!(task, "Background task panicked")
            }
            Err(_) => tracing::debug!(task, "Background task cancelled"),
        }
    })
}
