//! Push provider configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Minimum plausible length of a provider REST key.
const MIN_REST_KEY_LEN: usize = 20;

/// Credentials and endpoint of the push delivery provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Provider application identifier.
    #[serde(default)]
    pub app_id: String,
    /// Provider REST API key, sent as a bearer credential.
    #[serde(default)]
    pub rest_api_key: String,
    /// Notification creation endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Alias label that recipients are registered under on the provider.
    #[serde(default = "default_alias_label")]
    pub alias_label: String,
    /// Upper bound for a single provider request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            rest_api_key: String::new(),
            api_url: default_api_url(),
            alias_label: default_alias_label(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl PushConfig {
    /// Sanity-check the REST key before it is ever put on the wire.
    ///
    /// The key must be present, at least 20 characters long, and free of
    /// line breaks (a pasted key with a trailing newline is rejected by the
    /// provider with an opaque 403).
    pub fn validate_rest_key(&self) -> Result<(), AppError> {
        let key = self.rest_api_key.as_str();
        if key.trim().is_empty() {
            return Err(AppError::configuration("Push REST API key is not configured"));
        }
        if key.len() < MIN_REST_KEY_LEN {
            return Err(AppError::configuration(format!(
                "Push REST API key looks truncated ({} chars, expected at least {MIN_REST_KEY_LEN})",
                key.len()
            )));
        }
        if key.contains('\n') || key.contains('\r') {
            return Err(AppError::configuration(
                "Push REST API key contains a line break",
            ));
        }
        if self.app_id.trim().is_empty() {
            return Err(AppError::configuration("Push app id is not configured"));
        }
        Ok(())
    }

    /// First characters of the key, safe to include in diagnostics.
    pub fn key_prefix(&self) -> String {
        self.rest_api_key.chars().take(8).collect()
    }
}

fn default_api_url() -> String {
    "https://api.onesignal.com/notifications".to_string()
}

fn default_alias_label() -> String {
    "external_id".to_string()
}

fn default_request_timeout() -> u64 {
    15
}
