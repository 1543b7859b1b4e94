//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offgrid server.

pub mod cache;
pub mod worker_activate;
pub mod worker_fetch;
pub mod worker_install;
pub mod worker_status;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ServerError;

/// Pretty JSON text content, the shape every tool returns.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ServerError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
