//! # kb-mcp
//!
//! MCP (Model Context Protocol) server for the open data APIs of Kungliga
//! biblioteket, the Swedish National Library.
//!
//! The server exposes 52 tools over Libris (Xsearch, XL, OAI-PMH, SPARQL),
//! K-samsök, data.kb.se, Swepub and id.kb.se, a few of which combine several
//! of these sources in one call. It speaks JSON-RPC 2.0 over
//! stdin/stdout. Every tool call returns a [`ResultRecord`]: a status
//! (`ok`, `invalid-arguments`, `upstream-error` or `malformed-response`)
//! plus the fields extracted from the upstream response.
//!
//! ## Usage
//!
//! Configure the binary in an MCP client such as Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "kb": {
//!       "command": "/path/to/kb-mcp",
//!       "env": { "KB_HTTP_TIMEOUT": "30" }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use kb_mcp::{ApiClient, ClientConfig, ToolRegistry};
//! use serde_json::json;
//!
//! # async fn demo() -> kb_mcp::Result<()> {
//! let client = ApiClient::new(ClientConfig::default())?;
//! let registry = ToolRegistry::new();
//! let args = json!({"query": "Astrid Lindgren"}).as_object().cloned().unwrap_or_default();
//! let record = registry.call(&client, "libris_search", &args).await;
//! println!("{}", record.status.as_str());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod convert;
mod error;
pub mod normalize;
mod record;
pub mod render;
mod server;
pub mod tools;

pub use client::{ApiClient, RawResponse, RequestDescriptor};
pub use config::{ClientConfig, Endpoint, Endpoints};
pub use error::{McpError, Result};
pub use normalize::{normalize, FieldSpec, Template};
pub use record::{Fields, RecordStatus, ResultRecord};
pub use server::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, PROTOCOL_VERSION};
pub use tools::{ToolDef, ToolRegistry};
