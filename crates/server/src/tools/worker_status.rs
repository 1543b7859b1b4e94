//! worker_status tool implementation.

use offgrid_client::{ControllerInfo, OfflineWorker};
use offgrid_core::StoreSummary;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ControllerOutput {
    pub version: String,
    pub state: String,
}

impl From<ControllerInfo> for ControllerOutput {
    fn from(info: ControllerInfo) -> Self {
        Self { version: info.version, state: info.state.as_str().to_string() }
    }
}

/// Output structure for the worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub active: Option<ControllerOutput>,
    pub waiting: Option<ControllerOutput>,
    /// Every store on disk with its entry count.
    pub stores: Vec<StoreSummary>,
    /// Store writes still running in the background.
    pub background_tasks: usize,
}

pub async fn status_impl(worker: &OfflineWorker) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    let output = WorkerStatusOutput {
        active: status.active.map(ControllerOutput::from),
        waiting: status.waiting.map(ControllerOutput::from),
        stores: status.stores,
        background_tasks: status.background_tasks,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, parse, worker};

    #[tokio::test]
    async fn test_status_empty() {
        let (worker, _network) = worker().await;
        let output: WorkerStatusOutput = parse(&status_impl(&worker).await.unwrap());

        assert!(output.active.is_none());
        assert!(output.waiting.is_none());
        assert!(output.stores.is_empty());
    }

    #[tokio::test]
    async fn test_status_active_store() {
        let (worker, _network) = active_worker("v1").await;
        let output: WorkerStatusOutput = parse(&status_impl(&worker).await.unwrap());

        let active = output.active.unwrap();
        assert_eq!((active.version.as_str(), active.state.as_str()), ("v1", "active"));
        assert_eq!(output.stores.len(), 1);
        assert_eq!(output.stores[0].entries, 1);
        assert_eq!(output.background_tasks, 0);
    }
}
