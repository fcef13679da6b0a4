//! Cron scheduler for periodic jobs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use geliom_core::config::WorkerConfig;
use geliom_core::error::{AppError, ErrorKind};

use crate::executor::{JobExecutor, JobRun};
use crate::jobs::PENDING_NOTIFICATION_SWEEP;

/// Cron-based scheduler that runs registered jobs in-process.
///
/// A tick that fires while the previous run of the same job is still in
/// progress is skipped.
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("job_types", &self.executor.registered_types())
            .finish_non_exhaustive()
    }
}

impl CronScheduler {
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to create scheduler", e))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register every job enabled by `config`.
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register(&config.sweep_cron, PENDING_NOTIFICATION_SWEEP)
            .await?;
        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `job_type` on the `cron` schedule (six fields, with seconds).
    pub async fn register(&self, cron: &str, job_type: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for scheduled job '{job_type}'"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let running = Arc::new(AtomicBool::new(false));
        let name = job_type.to_string();

        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let running = Arc::clone(&running);
            let name = name.clone();
            Box::pin(async move {
                if running.swap(true, Ordering::AcqRel) {
                    tracing::debug!(job_type = %name, "Previous run still in progress, skipping tick");
                    return;
                }
                let run = JobRun::now(name);
                if let Err(e) = executor.execute(&run).await {
                    tracing::error!(run = %run.id, job_type = %run.job_type, error = %e, "Scheduled job failed");
                }
                running.store(false, Ordering::Release);
            })
        })
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid schedule '{cron}' for {job_type}"),
                e,
            )
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to add {job_type} schedule"),
                e,
            )
        })?;

        tracing::info!(job_type, cron, "Registered scheduled job");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to start scheduler", e))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler.shutdown().await.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to shut down scheduler", e)
        })?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
