//! Job executor: dispatches runs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use geliom_core::error::AppError;

/// One triggered execution of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRun {
    /// Run identifier, used to correlate log lines.
    pub id: Uuid,
    /// Handler type to dispatch to.
    pub job_type: String,
    /// When the run was triggered.
    pub triggered_at: DateTime<Utc>,
}

impl JobRun {
    /// A run of `job_type` triggered now.
    pub fn now(job_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            job_type: job_type.into(),
            triggered_at: Utc::now(),
        }
    }
}

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Get the job type this handler processes
    fn job_type(&self) -> &str;

    /// Execute one run
    async fn execute(&self, run: &JobRun) -> Result<Option<Value>, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; the next tick will fail the same way
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the next tick may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches runs to the appropriate handler based on job_type
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler, replacing any handler of the same type
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    /// Execute a run by dispatching to the correct handler
    pub async fn execute(&self, run: &JobRun) -> Result<Option<Value>, JobExecutionError> {
        let handler = self.handlers.get(&run.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                run.job_type
            ))
        })?;

        tracing::info!(run = %run.id, job_type = %run.job_type, "Executing job");
        handler.execute(run).await
    }

    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Get the list of registered job types
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}
