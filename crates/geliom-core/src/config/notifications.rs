//! Notification pipeline configuration.

use serde::{Deserialize, Serialize};

/// Tuning for the dispatcher and the pending-notification sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Delay applied to a pending row whose send was rate limited.
    #[serde(default = "default_reschedule_delay")]
    pub reschedule_delay_seconds: i64,
    /// Template used when a status carries no message pool of its own.
    #[serde(default = "default_template")]
    pub default_template: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            reschedule_delay_seconds: default_reschedule_delay(),
            default_template: default_template(),
        }
    }
}

fn default_reschedule_delay() -> i64 {
    60
}

/// Fallback status-change template.
pub fn default_template() -> String {
    "{name} durumunu \"{status}\" olarak güncelledi".to_string()
}
