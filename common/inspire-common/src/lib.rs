//! Inspire Common - Shared utilities for the inspiration services
//!
//! - **Initialization**: [`init_tracing`] for stderr logging (stdout belongs to MCP)
//! - **Results**: helpers for building `CallToolResult` responses
//! - **Errors**: [`IntoMcpError`] for mapping domain errors onto MCP errors
//!
//! Both `inspiration-mcp` and `verify-proxy` call [`init_tracing`] on startup.

pub mod error;
pub mod init;
pub mod result;

pub use error::{internal_error, invalid_params, IntoMcpError, McpResult, ResultExt};
pub use init::init_tracing;
pub use result::{json_success, text_success};

pub use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
