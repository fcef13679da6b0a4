//! User profile entity.

use geliom_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// User identifier.
    pub id: UserId,
    /// Display name chosen by the user.
    pub display_name: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Display name, or `fallback` when the user has none.
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback)
    }
}
