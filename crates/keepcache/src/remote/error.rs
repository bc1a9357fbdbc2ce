//! Error types for remote API operations.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the remote bookmark manager.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body was delivered but is not the JSON shape we expect.
    #[error("Failed to decode {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// A 2xx body that is not JSON, served with a non-JSON content type.
    #[error("Expected JSON from {endpoint}, got {content_type}")]
    NotJson {
        endpoint: String,
        content_type: String,
    },

    /// The response envelope had none of the known collection keys.
    #[error("Unexpected response shape from {endpoint}")]
    UnexpectedShape { endpoint: String },

    /// A paginated collection kept returning cursors.
    #[error("Pagination for {endpoint} exceeded {max_pages} pages")]
    TooManyPages { endpoint: String, max_pages: u32 },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Check if an error is worth another attempt.
///
/// Transport failures and every non-2xx status are retried. A body that
/// arrived but could not be decoded would arrive the same way again.
pub fn is_retryable(err: &RemoteError) -> bool {
    matches!(err, RemoteError::Http(_) | RemoteError::Api { .. })
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &RemoteError) -> String {
    match err {
        RemoteError::Http(HttpError::Transport(msg)) => truncate("Network error", msg),
        RemoteError::Http(e) => e.to_string(),
        RemoteError::Api { status, message } => {
            let message = message.trim();
            if message.is_empty() {
                format!("HTTP {}", status)
            } else {
                truncate(&format!("HTTP {}", status), message)
            }
        }
        RemoteError::Decode { endpoint, .. } => format!("Invalid JSON from {}", endpoint),
        RemoteError::NotJson {
            endpoint,
            content_type,
        } => format!("Non-JSON response ({}) from {}", content_type, endpoint),
        RemoteError::UnexpectedShape { endpoint } => format!("Unexpected response from {}", endpoint),
        RemoteError::TooManyPages { endpoint, .. } => format!("Too many pages from {}", endpoint),
        RemoteError::Config(msg) => format!("Config: {}", msg),
    }
}

fn truncate(prefix: &str, message: &str) -> String {
    if message.chars().count() > 50 {
        // Use chars() to avoid panicking on multi-byte UTF-8
        let truncated: String = message.chars().take(47).collect();
        format!("{}: {}...", prefix, truncated)
    } else {
        format!("{}: {}", prefix, message)
    }
}
