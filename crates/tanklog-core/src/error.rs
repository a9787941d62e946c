//! Error types for tanklog-core

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using tanklog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tanklog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx API response with the server-provided message when parseable
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Secure storage error
    #[error("Secure storage error: {0}")]
    SecureStorage(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// Request suppressed by the duplicate-request guard
    #[error("Duplicate request suppressed for {0}")]
    DuplicateRequest(String),

    /// Stored access token is malformed or expired
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for 401/403 responses, which the clients treat as terminal for
    /// the stored session.
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

/// Build an [`Error::Api`] from a response status and raw body.
///
/// The backend returns `{"message": ...}` payloads; `error` and
/// `error_description` are accepted as fallbacks for proxy-shaped errors.
pub fn api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| {
            payload
                .message
                .or(payload.error_description)
                .or(payload.error)
        })
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = crate::util::compact_text(body);
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed
            }
        });

    Error::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn api_error_prefers_server_message() {
        let error = api_error(400, r#"{"message": "Email already registered"}"#);
        match error {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let error = api_error(502, "Bad Gateway");
        assert_eq!(error.to_string(), "API error (502): Bad Gateway");
    }

    #[test]
    fn api_error_handles_empty_body() {
        let error = api_error(500, "");
        assert_eq!(error.to_string(), "API error (500): HTTP 500");
    }

    #[test]
    fn auth_rejection_matches_401_and_403() {
        assert!(api_error(401, "").is_auth_rejection());
        assert!(api_error(403, "").is_auth_rejection());
        assert!(!api_error(429, "").is_auth_rejection());
        assert!(!Error::InvalidInput("x".to_string()).is_auth_rejection());
    }
}
