//! cache_purge tool implementation.
//!
//! Deletes stores left behind by earlier versions. The store serving
//! requests, and one parked for activation, are never deleted.

use offgrid_client::OfflineWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete only this store. Every stale store when omitted.
    #[serde(default)]
    pub version: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Versions whose stores were deleted.
    pub purged: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &OfflineWorker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let purged = worker.purge(params.version.as_deref()).await?;
    json_result(&CachePurgeOutput { purged })
}
