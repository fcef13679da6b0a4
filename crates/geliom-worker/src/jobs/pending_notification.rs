//! Periodic sweep of due pending notifications.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use geliom_service::PendingNotificationSweeper;

use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Job type of the sweep.
pub const PENDING_NOTIFICATION_SWEEP: &str = "pending_notification_sweep";

/// Runs one sweep per trigger and reports its totals.
#[derive(Debug)]
pub struct PendingNotificationJob {
    sweeper: Arc<PendingNotificationSweeper>,
}

impl PendingNotificationJob {
    pub fn new(sweeper: Arc<PendingNotificationSweeper>) -> Self {
        Self { sweeper }
    }
}

#[async_trait]
impl JobHandler for PendingNotificationJob {
    fn job_type(&self) -> &str {
        PENDING_NOTIFICATION_SWEEP
    }

    async fn execute(&self, run: &JobRun) -> Result<Option<Value>, JobExecutionError> {
        let report = self
            .sweeper
            .sweep(run.triggered_at)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Pending sweep failed: {e}")))?;

        if report.total > 0 {
            tracing::info!(
                run = %run.id,
                total = report.total,
                processed = report.processed,
                errors = report.errors,
                "Pending notification sweep finished"
            );
        }

        Ok(Some(serde_json::json!({
            "processed": report.processed,
            "errors": report.errors,
            "total": report.total,
        })))
    }
}
