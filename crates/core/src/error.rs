//! Unified error types for sitealias.
//!
//! The upper-case prefixes are stable codes that callers and the MCP layer
//! can match on.

use std::path::Path;

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the alias cache and the agent workflows.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem read/parse/write failure on a cache artifact.
    #[error("CACHE_IO_ERROR: {path}: {message}")]
    CacheIo { path: String, message: String },

    /// No agent identifier configured, or the platform could not produce the agent.
    #[error("AGENT_LOOKUP_ERROR: {0}")]
    AgentLookup(String),

    /// Transport or service failure talking to the agent platform.
    #[error("PLATFORM_ERROR: {0}")]
    Platform(String),

    /// Assistant reply was empty or not the expected JSON shape.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// A run did not reach a terminal state within its budget.
    #[error("RUN_TIMEOUT: {0}")]
    RunTimeout(String),

    /// Invalid input parameters (e.g., empty phrase).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A required collaborator (platform endpoint, agent role) is not configured.
    #[error("NOT_CONFIGURED: {0}")]
    NotConfigured(String),
}

impl Error {
    /// Build a [`Error::CacheIo`] for the given artifact path.
    pub fn cache_io(path: &Path, err: impl std::fmt::Display) -> Self {
        Error::CacheIo { path: path.display().to_string(), message: err.to_string() }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheIo { .. } => (-32002, err.to_string()),
            Error::AgentLookup(msg) => (-32020, msg.clone()),
            Error::Platform(msg) => (-32021, msg.clone()),
            Error::Parse(msg) => (-32022, msg.clone()),
            Error::RunTimeout(msg) => (-32023, msg.clone()),
            Error::NotConfigured(msg) => (-32024, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::AgentLookup("resolver".to_string());
        assert!(err.to_string().contains("AGENT_LOOKUP_ERROR"));
        assert!(err.to_string().contains("resolver"));
    }

    #[test]
    fn test_cache_io_carries_path() {
        let err = Error::cache_io(Path::new("/tmp/cache/urls.json"), "unexpected EOF");
        let msg = err.to_string();
        assert!(msg.starts_with("CACHE_IO_ERROR"));
        assert!(msg.contains("urls.json"));
        assert!(msg.contains("unexpected EOF"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("phrase cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);

        let mcp_err: McpError = Error::AgentLookup("validator".into()).into();
        assert_eq!(mcp_err.code.0, -32020);
    }
}
