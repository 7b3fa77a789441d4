//! MCP server for QA Sphere.
//!
//! Speaks JSON-RPC 2.0 over newline-delimited stdio and exposes the tools in
//! [`crate::tools`].
//!
//! ## Example
//!
//! ```no_run
//! use qasphere_mcp::mcp::McpServer;
//! use qasphere_mcp::Config;
//!
//! #[tokio::main]
//! async fn main() -> qasphere_mcp::QaSphereResult<()> {
//!     let config = Config::resolve("qasphere.toml")?;
//!     config.validate()?;
//!     McpServer::new(&config)?.run().await
//! }
//! ```

pub mod protocol;
mod server;
mod tools;
mod transport;

pub use protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolContent, ToolDescription, ToolResult,
    ToolsCapability, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR, PROTOCOL_VERSION,
};

pub use server::McpServer;
pub use tools::ToolHandler;
pub use transport::{Incoming, LineTransport, StdioTransport, TrafficLog};
