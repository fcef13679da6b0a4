//! Scheduled background jobs for Geliom.
//!
//! This crate provides:
//! - A cron scheduler that triggers registered jobs in-process
//! - A job executor that dispatches a run to the handler for its type
//! - The pending-notification sweep job

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler, JobRun};
pub use scheduler::CronScheduler;
