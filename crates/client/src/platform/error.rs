//! Agent platform client error types.

use std::sync::Arc;

/// Errors from the agent platform client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    /// No endpoint configured.
    #[error("missing endpoint: SITEALIAS_ENDPOINT not set")]
    MissingEndpoint,

    /// Endpoint is not a usable base URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Authentication failed (invalid or missing credential).
    #[error("authentication failed")]
    AuthError,

    /// The addressed agent, thread or run does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl PlatformError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::RateLimited | PlatformError::Timeout | PlatformError::Network(_) => true,
            PlatformError::HttpError { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { PlatformError::Timeout } else { PlatformError::Network(Arc::new(err)) }
    }
}

impl From<PlatformError> for sitealias_core::Error {
    fn from(err: PlatformError) -> Self {
        sitealias_core::Error::Platform(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlatformError::MissingEndpoint;
        assert!(err.to_string().contains("SITEALIAS_ENDPOINT"));

        let err = PlatformError::NotFound("thread_abc".to_string());
        assert!(err.to_string().contains("thread_abc"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(PlatformError::HttpError { status: 503 }.is_transient());
        assert!(PlatformError::RateLimited.is_transient());
        assert!(PlatformError::Timeout.is_transient());
        assert!(!PlatformError::HttpError { status: 400 }.is_transient());
        assert!(!PlatformError::AuthError.is_transient());
        assert!(!PlatformError::Parse("bad".into()).is_transient());
    }

    #[test]
    fn test_into_core_error() {
        let err: sitealias_core::Error = PlatformError::RateLimited.into();
        assert!(matches!(err, sitealias_core::Error::Platform(_)));
    }
}
