//! Chat client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::SyncError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 250;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Portal origin without a trailing slash, e.g. `https://obsidiantime.ru`.
    pub base_url: String,
    pub poll_interval: Duration,
    pub scroll_throttle: Duration,
    pub timeouts: HttpTimeouts,
    /// Username of the session owner; messages by this author render as own.
    pub username: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            scroll_throttle: Duration::from_millis(DEFAULT_SCROLL_THROTTLE_MS),
            timeouts: HttpTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            username: None,
        }
    }
}

impl SyncConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `OBSIDIAN_BASE_URL`: portal origin, default `http://127.0.0.1:8000`
    /// - `CHAT_POLL_INTERVAL_MS`: default 3000, must be non-zero
    /// - `CHAT_SCROLL_THROTTLE_MS`: default 250
    /// - `CHAT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CHAT_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CHAT_USERNAME`: session identity for own-message marking
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] for a malformed base URL or a zero poll interval.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] for a malformed base URL or a zero poll interval.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("OBSIDIAN_BASE_URL").as_deref())?;

        let poll_interval_ms = parse_or("CHAT_POLL_INTERVAL_MS", lookup("CHAT_POLL_INTERVAL_MS"), DEFAULT_POLL_INTERVAL_MS);
        if poll_interval_ms == 0 {
            return Err(SyncError::Config("CHAT_POLL_INTERVAL_MS must be greater than zero".into()));
        }
        let scroll_throttle_ms =
            parse_or("CHAT_SCROLL_THROTTLE_MS", lookup("CHAT_SCROLL_THROTTLE_MS"), DEFAULT_SCROLL_THROTTLE_MS);

        let timeouts = HttpTimeouts {
            request_secs: parse_or(
                "CHAT_REQUEST_TIMEOUT_SECS",
                lookup("CHAT_REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            connect_secs: parse_or(
                "CHAT_CONNECT_TIMEOUT_SECS",
                lookup("CHAT_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        };

        let username = lookup("CHAT_USERNAME")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());

        Ok(Self {
            base_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            scroll_throttle: Duration::from_millis(scroll_throttle_ms),
            timeouts,
            username,
        })
    }
}

fn parse_or(key: &str, raw: Option<String>, default: u64) -> u64 {
    match raw.as_deref().map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!(key, value, default, "ignoring unparseable config value");
            default
        }),
    }
}

/// Validate and normalize the portal origin.
///
/// # Errors
///
/// Returns [`SyncError::Config`] when the scheme is not `http` or `https`.
pub fn parse_base_url(raw: Option<&str>) -> Result<String, SyncError> {
    let url = raw.map_or(DEFAULT_BASE_URL, str::trim);
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(SyncError::Config(format!("OBSIDIAN_BASE_URL must be http(s): {url}")));
    }
    Ok(url.trim_end_matches('/').to_owned())
}
