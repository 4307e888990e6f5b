//! Environment variable overrides for runtime configuration.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Reads `key` and parses it as `T`.
///
/// Returns `None` when the variable is unset, empty, or fails to parse; a
/// parse failure is logged so a typo doesn't silently fall back to defaults.
pub fn parse_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %trimmed, error = %e, "ignoring invalid environment value");
            None
        }
    }
}

/// Reads `key` as a number of milliseconds.
pub fn parse_env_millis(key: &str) -> Option<Duration> {
    parse_env::<u64>(key).map(Duration::from_millis)
}

/// Reads `key` as a non-empty string.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
