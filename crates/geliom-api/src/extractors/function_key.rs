//! Guard for the two function endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use geliom_core::error::AppError;

use super::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// A caller allowed to invoke the notification functions.
///
/// When `auth.function_key` is empty the endpoints are open; otherwise the
/// request must carry `Authorization: Bearer <function_key>`.
#[derive(Debug, Clone, Copy)]
pub struct FunctionCaller;

impl FromRequestParts<AppState> for FunctionCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.auth.function_key.as_str();
        if expected.is_empty() {
            return Ok(FunctionCaller);
        }

        let presented = bearer_token(parts)?;
        if presented != expected {
            return Err(AppError::authentication("Invalid function key").into());
        }
        Ok(FunctionCaller)
    }
}
