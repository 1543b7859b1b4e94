//! Errors raised by the server layer itself.
//!
//! Worker and store failures arrive as `offgrid_core::Error` and carry their
//! own codes; this covers what can go wrong while shaping tool output.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Tool output could not be encoded as JSON.
    #[error("ENCODE_FAILED: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let code = match &err {
            ServerError::Encode(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
