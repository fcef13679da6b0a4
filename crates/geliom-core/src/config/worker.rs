//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the in-process scheduler is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the pending-notification sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_cron: default_sweep_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_cron() -> String {
    "0 * * * * *".to_string()
}
