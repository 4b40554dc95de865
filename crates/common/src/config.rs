//! Plain key/value configuration overrides with static defaults.

use std::str::FromStr;

/// Reads `key` from the environment, falling back to `default` when the
/// variable is unset or empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

/// Reads and parses `key`, falling back to `default` when the variable is
/// unset, empty or unparsable.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
