//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the offline worker.
use std::sync::Arc;

use offgrid_client::OfflineWorker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::worker_activate::activate_impl;
use crate::tools::worker_fetch::{WorkerFetchParams, fetch_impl};
use crate::tools::worker_install::{WorkerInstallParams, install_impl};
use crate::tools::worker_status::status_impl;

/// The main MCP server handler for offgrid.
#[derive(Clone)]
pub struct OffgridServer {
    worker: Arc<OfflineWorker>,
    /// Manifest used when worker_install is called without one.
    manifest: Arc<[String]>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OffgridServer {
    pub fn new(worker: Arc<OfflineWorker>, manifest: Vec<String>) -> Self {
        Self { worker, manifest: manifest.into(), tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Send a request through the offline worker. Returns status, headers, body and whether the answer came from the network, the store, or the offline fallback."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    /// Install a version from its asset manifest.
    ///
    /// Every asset must fetch with a 2xx status or nothing is stored and the
    /// current version keeps serving.
    #[tool(description = "Install a new version from an asset manifest and activate it (or park it as waiting).")]
    async fn worker_install(&self, params: Parameters<WorkerInstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker, &self.manifest, params.0).await
    }

    #[tool(description = "Activate the installed version that is waiting.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Report the active and waiting versions and the entry count of every store.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    #[tool(description = "Read one stored response by URL, from the active store or a named version.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Delete stale stores: one named version, or every store not in use.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for OffgridServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offgrid".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
