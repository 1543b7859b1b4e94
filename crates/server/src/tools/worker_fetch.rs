//! worker_fetch tool implementation.
//!
//! Sends one request through the offline worker, exactly as the hosted page
//! would, and reports where the answer came from.

use offgrid_client::OfflineWorker;
use offgrid_core::{Destination, Method, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request destination, e.g. "image" or "document" (default: none).
    #[serde(default)]
    pub destination: Option<Destination>,

    /// Request body, forwarded for non-GET requests.
    #[serde(default)]
    pub body: Option<String>,
}

/// Output structure for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    pub status: u16,
    /// "network", "cache", "offline" or "passthrough".
    pub source: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

pub async fn fetch_impl(worker: &OfflineWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let method = match params.method.as_deref() {
        Some(method) => method.parse::<Method>()?,
        None => Method::Get,
    };

    let mut request = Request::new(method, url);
    request.destination = params.destination.unwrap_or_default();
    if let Some(body) = params.body {
        request = request.with_body(body.into_bytes());
    }

    let url = request.url.to_string();
    let served = worker.handle(request).await?;
    tracing::debug!(%url, status = served.response.status, source = served.source.as_str(), "worker_fetch served");

    let output = WorkerFetchOutput {
        url,
        status: served.response.status,
        source: served.source.as_str().to_string(),
        body: String::from_utf8_lossy(&served.response.body).into_owned(),
        headers: served.response.headers,
    };
    json_result(&output)
}
