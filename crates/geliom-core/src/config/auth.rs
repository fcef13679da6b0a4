//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token verification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used by the identity provider to sign user JWTs.
    #[serde(default)]
    pub jwt_secret: String,
    /// Bearer key required on the function endpoints. Empty disables the check.
    #[serde(default)]
    pub function_key: String,
}

