//! Guarded one-time initialization of a shared resource.
//!
//! A [`LazyResource`] moves through explicit states:
//! `Uninitialized → Initializing → Ready | Failed`. Concurrent callers that
//! arrive while initialization is in flight await the same future instead
//! of starting a second one.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::AppError;
use crate::result::AppResult;

type InitFuture<T> = Shared<BoxFuture<'static, Result<Arc<T>, AppError>>>;

enum LazyState<T> {
    Uninitialized,
    Initializing(InitFuture<T>),
    Ready(Arc<T>),
    Failed(AppError),
}

/// Observable state of a [`LazyResource`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyStatus {
    /// Nobody has asked for the resource yet (or it was reset).
    Uninitialized,
    /// An initialization future is in flight.
    Initializing,
    /// The resource is available.
    Ready,
    /// The last initialization failed; the error is replayed until reset.
    Failed,
}

/// A lazily initialized, shareable resource.
pub struct LazyResource<T> {
    name: &'static str,
    state: Mutex<LazyState<T>>,
}

impl<T> std::fmt::Debug for LazyResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyResource")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

impl<T: Send + Sync + 'static> LazyResource<T> {
    /// Create an uninitialized resource. `name` is used in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(LazyState::Uninitialized),
        }
    }

    /// Return the resource, running `init` if nobody has done so yet.
    ///
    /// `init` is only invoked from the `Uninitialized` state. A failed
    /// initialization is cached and returned to later callers until
    /// [`reset`](Self::reset) is called.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            match &*state {
                LazyState::Ready(value) => return Ok(Arc::clone(value)),
                LazyState::Failed(err) => return Err(err.clone()),
                LazyState::Initializing(fut) => fut.clone(),
                LazyState::Uninitialized => {
                    tracing::debug!(resource = self.name, "Initializing resource");
                    let fut: InitFuture<T> = init().map(|r| r.map(Arc::new)).boxed().shared();
                    *state = LazyState::Initializing(fut.clone());
                    fut
                }
            }
        };

        let result = pending.await;

        let mut state = self.lock();
        // A reset while we were waiting wins; only settle our own attempt.
        if matches!(&*state, LazyState::Initializing(_)) {
            *state = match &result {
                Ok(value) => {
                    tracing::info!(resource = self.name, "Resource ready");
                    LazyState::Ready(Arc::clone(value))
                }
                Err(err) => {
                    tracing::error!(resource = self.name, error = %err, "Resource initialization failed");
                    LazyState::Failed(err.clone())
                }
            };
        }
        result
    }

    /// Return the resource if it is already initialized.
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            LazyState::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Forget any cached value or failure.
    pub fn reset(&self) {
        *self.lock() = LazyState::Uninitialized;
    }
}

impl<T> LazyResource<T> {
    /// Current state.
    pub fn status(&self) -> LazyStatus {
        match &*self.lock() {
            LazyState::Uninitialized => LazyStatus::Uninitialized,
            LazyState::Initializing(_) => LazyStatus::Initializing,
            LazyState::Ready(_) => LazyStatus::Ready,
            LazyState::Failed(_) => LazyStatus::Failed,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LazyState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
