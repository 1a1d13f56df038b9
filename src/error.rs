//! Error types for the MCP server.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors raised while validating arguments, calling an upstream API, or
/// normalizing its response.
///
/// Tool-level variants are never surfaced to the MCP client as JSON-RPC
/// errors; the registry folds them into a [`crate::ResultRecord`].
#[derive(Debug, Error)]
pub enum McpError {
    /// Tool name not present in the binding table.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument was absent or had the wrong JSON type.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// An argument was present but its value is not acceptable.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The upstream service could not be reached, timed out, or answered
    /// with a non-success status.
    #[error("upstream error: {message}")]
    Upstream {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Human readable cause
        message: String,
    },

    /// The upstream body could not be parsed as declared, or a required
    /// field was absent.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Invalid base URL or path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// JSON (de)serialization failure on the JSON-RPC channel.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure on the stdio transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Shorthand for [`McpError::InvalidArg`].
    pub fn invalid_arg(name: &str, reason: impl Into<String>) -> Self {
        McpError::InvalidArg {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("could not connect: {}", err)
        } else {
            err.to_string()
        };
        McpError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}
