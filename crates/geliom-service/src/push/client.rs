//! reqwest-based OneSignal client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{error, info};

use geliom_core::config::PushConfig;
use geliom_core::error::{AppError, ErrorKind};
use geliom_core::task::LazyResource;

use super::diagnosis;
use super::request::CreateNotification;
use super::{PushError, PushMessage, PushProvider, PushReceipt};

/// Posts notifications to the OneSignal REST API.
///
/// The underlying HTTP client is built on first use and shared by every
/// later delivery.
pub struct OneSignalClient {
    config: PushConfig,
    http: LazyResource<reqwest::Client>,
}

impl std::fmt::Debug for OneSignalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneSignalClient")
            .field("api_url", &self.config.api_url)
            .field("app_id", &self.config.app_id)
            .field("key_prefix", &self.config.key_prefix())
            .field("http", &self.http)
            .finish()
    }
}

impl OneSignalClient {
    /// Create a client. No connection is made until the first delivery.
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            http: LazyResource::new("push-http-client"),
        }
    }

    async fn http(&self) -> Result<Arc<reqwest::Client>, AppError> {
        let timeout = Duration::from_secs(self.config.request_timeout_seconds);
        self.http
            .get_or_init(move || async move {
                reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| {
                        AppError::with_source(
                            ErrorKind::Configuration,
                            "Failed to build push HTTP client",
                            e,
                        )
                    })
            })
            .await
    }
}

#[async_trait]
impl PushProvider for OneSignalClient {
    fn check_credentials(&self) -> Result<(), AppError> {
        self.config.validate_rest_key()
    }

    async fn deliver(&self, message: &PushMessage) -> Result<PushReceipt, PushError> {
        self.check_credentials().map_err(PushError::Configuration)?;
        let http = self.http().await.map_err(PushError::Configuration)?;

        let body = CreateNotification::new(&self.config.app_id, &self.config.alias_label, message);
        let key = self.config.rest_api_key.as_str();

        let response = http
            .post(&self.config.api_url)
            .header(AUTHORIZATION, format!("{} {key}", diagnosis::auth_scheme(key)))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PushError::Transport(AppError::with_source(
                    ErrorKind::ExternalService,
                    "Push provider request failed",
                    e,
                ))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            PushError::Transport(AppError::with_source(
                ErrorKind::ExternalService,
                "Failed to read push provider response",
                e,
            ))
        })?;

        if !status.is_success() {
            let diagnosis = (status == StatusCode::FORBIDDEN)
                .then(|| diagnosis::forbidden(&self.config, &text));
            error!(
                status = status.as_u16(),
                body = %text,
                recipients = message.recipients.len(),
                "Push provider rejected notification"
            );
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body: text,
                diagnosis,
            });
        }

        let receipt: PushReceipt = serde_json::from_str(&text).unwrap_or_default();
        info!(
            id = receipt.id.as_deref().unwrap_or("-"),
            recipients = message.recipients.len(),
            notification_type = %message.notification_type,
            "Push notification accepted"
        );
        Ok(receipt)
    }
}
