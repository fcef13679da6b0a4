//! `AuthUser` extractor: pulls the bearer JWT from the Authorization header
//! and resolves the calling user from its `sub` claim.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use geliom_core::config::AuthConfig;
use geliom_core::error::AppError;
use geliom_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried by a user access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: UserId,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("configured", &self.decoding_key.is_some())
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Build a verifier. An empty secret rejects every token.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 5;

        let decoding_key = (!config.jwt_secret.is_empty())
            .then(|| DecodingKey::from_secret(config.jwt_secret.as_bytes()));

        Self {
            decoding_key,
            validation,
        }
    }

    /// Decode and validate `token`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| AppError::authentication("Token authentication is not configured"))?;

        decode::<Claims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::authentication("Invalid or expired token")
            })
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.0
    }
}

/// Extract the token from an `Authorization: Bearer ...` header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;
        Ok(AuthUser(claims.sub))
    }
}
