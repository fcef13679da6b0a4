//! Client-side cache configuration.

use serde::{Deserialize, Serialize};

/// Query cache and lookup memo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum memoised point lookups (statuses, moods, profiles).
    #[serde(default = "default_lookup_capacity")]
    pub lookup_capacity: u64,
    /// TTL for memoised point lookups in seconds.
    #[serde(default = "default_lookup_ttl")]
    pub lookup_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lookup_capacity: default_lookup_capacity(),
            lookup_ttl_seconds: default_lookup_ttl(),
        }
    }
}

fn default_lookup_capacity() -> u64 {
    1000
}

fn default_lookup_ttl() -> u64 {
    300
}
