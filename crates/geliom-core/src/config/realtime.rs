//! Realtime change feed configuration.

use serde::{Deserialize, Serialize};

/// Change feed and subscription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Buffer size of each in-process broadcast channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Postgres NOTIFY channel carrying row change payloads.
    #[serde(default = "default_notify_channel")]
    pub notify_channel: String,
    /// Attempts made to (re)establish the listener connection.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Delay between listener reconnect attempts in milliseconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            notify_channel: default_notify_channel(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_notify_channel() -> String {
    "geliom_changes".to_string()
}

fn default_reconnect_attempts() -> u32 {
    10
}

fn default_reconnect_delay() -> u64 {
    2000
}
