//! Heuristic hints attached to a 403 from the push provider.

use serde_json::{Value, json};

use geliom_core::config::PushConfig;

/// Build the diagnosis block for a forbidden response.
///
/// Only key metadata is included (length, prefix, format), never the key
/// itself.
pub fn forbidden(config: &PushConfig, body: &str) -> Value {
    let key = config.rest_api_key.as_str();
    let mut hints = Vec::new();

    if !key.starts_with("os_v2_") {
        hints.push(
            "Key does not use the os_v2_ format; legacy keys must be sent with the Basic scheme",
        );
    }
    if key.trim() != key {
        hints.push("Key has leading or trailing whitespace");
    }
    let lowered = body.to_lowercase();
    if lowered.contains("app_id") || lowered.contains("app id") {
        hints.push("Provider complained about the app id; check it matches the key's app");
    }
    if lowered.contains("access denied") || lowered.contains("unauthorized") {
        hints.push("Key was rejected; it may be revoked or belong to another app");
    }
    if hints.is_empty() {
        hints.push("Key format looks valid; verify it was issued for this app and has not been rotated");
    }

    json!({
        "key_length": key.len(),
        "key_prefix": config.key_prefix(),
        "auth_scheme": auth_scheme(key),
        "app_id": config.app_id,
        "hints": hints,
    })
}

/// Authorization scheme the provider expects for `key`.
pub fn auth_scheme(key: &str) -> &'static str {
    if key.starts_with("os_v2_") { "Key" } else { "Basic" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> PushConfig {
        PushConfig {
            app_id: "app-1".into(),
            rest_api_key: key.into(),
            ..PushConfig::default()
        }
    }

    #[test]
    fn test_never_leaks_full_key() {
        let key = "os_v2_app_supersecretvalue1234";
        let block = forbidden(&config(key), "{\"errors\":[\"Access denied\"]}");
        assert!(!block.to_string().contains(key));
        assert_eq!(block["key_prefix"], "os_v2_ap");
        assert_eq!(block["auth_scheme"], "Key");
    }

    #[test]
    fn test_legacy_key_hint() {
        let block = forbidden(&config("NGEwMGZmMjItY2NkNy0xMWUzLTk5ZDUtMDAwYzI5NDBlNjJj"), "");
        assert_eq!(block["auth_scheme"], "Basic");
        assert!(block["hints"][0].as_str().unwrap().contains("os_v2_"));
    }
}
