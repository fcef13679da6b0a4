//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use geliom_service::{DispatchReport, SweepReport};

/// Successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub result: DispatchReport,
}

impl SendNotificationResponse {
    pub fn ok(result: DispatchReport) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

/// Result of a sweep invocation.
///
/// An empty sweep reports only `processed` and a message; a non-empty one
/// reports the full totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResponse {
    pub success: bool,
    pub processed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&SweepReport> for SweepResponse {
    fn from(report: &SweepReport) -> Self {
        if report.total == 0 {
            return Self {
                success: true,
                processed: 0,
                errors: None,
                total: None,
                message: Some("No pending notifications to process".to_string()),
            };
        }
        Self {
            success: true,
            processed: report.processed,
            errors: Some(report.errors),
            total: Some(report.total),
            message: None,
        }
    }
}

/// Body of a 429 from the dispatch function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    /// Always `rate_limit_exceeded`.
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_seconds: Option<i64>,
}

/// Body of a provider rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderErrorResponse {
    pub error: String,
    /// Provider response body, verbatim.
    pub details: String,
    /// Provider status code.
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Value>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    pub version: String,
    /// Database reachability, when a pool is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<bool>,
}
