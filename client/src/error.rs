//! Error type shared by the chat client.
//!
//! ERROR HANDLING
//! ==============
//! The engine never surfaces these to the page as fatal: forward-poll
//! failures are logged and retried on the next tick, backward-page failures
//! become a one-shot notice. `retryable()` tells hosts which failures are
//! worth re-triggering.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced by configuration, HTTP transport, and form submission.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A configuration value could not be parsed or is out of range.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect, timeout, I/O).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success HTTP status.
    #[error("server responded with status {status}")]
    Status { status: u16 },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The server accepted the request but reported `success: false`.
    #[error("server rejected request: {0}")]
    Rejected(String),

    /// Client-side validation refused the input before any request was sent.
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl SyncError {
    /// Stable machine-readable code for logs and host UIs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_REQUEST",
            Self::Status { .. } => "E_STATUS",
            Self::Parse(_) => "E_PARSE",
            Self::Rejected(_) => "E_REJECTED",
            Self::Invalid(_) => "E_INVALID",
        }
    }

    /// Whether repeating the same request may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599 })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status { status: status.as_u16() }
        } else {
            Self::Request(err.to_string())
        }
    }
}
