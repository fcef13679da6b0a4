//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use geliom_core::error::{AppError, ErrorKind};
use geliom_service::DispatchError;

use crate::dto::response::{ProviderErrorResponse, RateLimitResponse};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code, or the message itself for failures the
    /// caller shows verbatim.
    pub error: String,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Diagnostic detail for server-side failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error returned by every handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The request body could not be read as the expected JSON.
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::App(err) => app_error_response(err),
            Self::Dispatch(err) => dispatch_error_response(err),
            Self::BadRequest(message) => bad_request(message),
        }
    }
}

fn bad_request(message: String) -> Response {
    let body = ApiErrorResponse {
        error: message,
        message: None,
        details: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn app_error_response(err: AppError) -> Response {
    let (status, error_code) = match err.kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Cache
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::ExternalService => {
            tracing::error!(kind = %err.kind, error = %err.details(), "Internal server error");
            return internal(err.message.clone(), err.details());
        }
    };

    let body = ApiErrorResponse {
        error: error_code.to_string(),
        message: Some(err.message),
        details: None,
    };
    (status, Json(body)).into_response()
}

fn dispatch_error_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Validation(message) => bad_request(message),
        DispatchError::NoValidRecipients => bad_request("No valid recipients found".to_string()),
        DispatchError::RateLimited {
            wait_until,
            wait_seconds,
        } => {
            let message = match wait_seconds {
                Some(seconds) => format!(
                    "Bu kişiye çok sık bildirim gönderiyorsun. {seconds} saniye sonra tekrar dene."
                ),
                None => "Tüm alıcılar için bildirim sınırına ulaşıldı.".to_string(),
            };
            let body = RateLimitResponse {
                error: "rate_limit_exceeded".to_string(),
                message,
                wait_until,
                wait_seconds,
            };
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            if let Some(seconds) = wait_seconds {
                if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            response
        }
        DispatchError::Provider {
            status,
            body,
            diagnosis,
        } => {
            tracing::error!(status, body = %body, "Push provider rejected notification");
            let body = ProviderErrorResponse {
                error: "Push provider rejected the notification".to_string(),
                details: body,
                status,
                diagnosis,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
        DispatchError::Configuration(err) | DispatchError::Internal(err) => {
            tracing::error!(kind = %err.kind, error = %err.details(), "Dispatch failed");
            internal(err.message.clone(), err.details())
        }
    }
}

fn internal(error: String, details: String) -> Response {
    let body = ApiErrorResponse {
        error,
        message: None,
        details: Some(details),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
