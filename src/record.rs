//! The uniform result shape returned by every tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::McpError;

/// Flat mapping of extracted field name to value.
pub type Fields = Map<String, JsonValue>;

/// Outcome of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    /// Upstream answered and the body was normalized.
    Ok,
    /// Rejected before any network call.
    InvalidArguments,
    /// Network failure, timeout, or non-2xx status.
    UpstreamError,
    /// Body could not be parsed as declared, or a required field was absent.
    MalformedResponse,
}

impl RecordStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "ok",
            RecordStatus::InvalidArguments => "invalid-arguments",
            RecordStatus::UpstreamError => "upstream-error",
            RecordStatus::MalformedResponse => "malformed-response",
        }
    }
}

/// Result Record returned to the MCP client for every tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Always present.
    pub status: RecordStatus,
    /// Extracted fields; empty on failure.
    #[serde(default)]
    pub fields: Fields,
    /// Raw upstream body, for tools that return it verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Error description when `status` is not `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// HTTP status reported by the upstream service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl ResultRecord {
    /// A successful record carrying `fields`.
    pub fn ok(fields: Fields) -> Self {
        Self {
            status: RecordStatus::Ok,
            fields,
            raw: None,
            error: None,
            upstream_status: None,
        }
    }

    /// A failed record with no fields and no body.
    pub fn failure(status: RecordStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            fields: Fields::new(),
            raw: None,
            error: Some(message.into()),
            upstream_status: None,
        }
    }

    /// Attach the raw upstream body.
    pub fn with_raw(mut self, raw: String) -> Self {
        self.raw = Some(raw);
        self
    }

    /// `true` when `status` is `ok`.
    pub fn is_ok(&self) -> bool {
        self.status == RecordStatus::Ok
    }
}

impl From<McpError> for ResultRecord {
    fn from(err: McpError) -> Self {
        let status = match &err {
            McpError::UnknownTool(_) | McpError::MissingArg(_) | McpError::InvalidArg { .. } => {
                RecordStatus::InvalidArguments
            }
            McpError::Malformed(_) | McpError::Json(_) => RecordStatus::MalformedResponse,
            McpError::Upstream { .. }
            | McpError::Url(_)
            | McpError::Io(_)
            | McpError::Internal(_) => RecordStatus::UpstreamError,
        };
        let upstream_status = match &err {
            McpError::Upstream { status, .. } => *status,
            _ => None,
        };
        let mut record = ResultRecord::failure(status, err.to_string());
        record.upstream_status = upstream_status;
        record
    }
}
