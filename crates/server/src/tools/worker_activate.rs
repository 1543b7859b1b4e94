//! worker_activate tool implementation.
//!
//! Activates the waiting version when the worker is configured not to skip
//! waiting on install.

use offgrid_client::OfflineWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;
use super::worker_install::RegistrationOutput;

pub async fn activate_impl(worker: &OfflineWorker) -> Result<CallToolResult, McpError> {
    let registration = worker.skip_waiting().await?;
    json_result(&RegistrationOutput::from(registration))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{CannedNetwork, ORIGIN, parse};
    use offgrid_client::WorkerPolicy;
    use offgrid_core::CacheDb;
    use url::Url;

    #[tokio::test]
    async fn test_activate_waiting_version() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(CannedNetwork::default());
        network.respond("/", 200, "shell");
        let policy = WorkerPolicy { skip_waiting: false, ..Default::default() };
        let worker = OfflineWorker::new(db, network, Url::parse(ORIGIN).unwrap(), policy);
        worker.register("v1", &["/".to_string()]).await.unwrap();
        assert!(worker.active_version().await.is_none());

        let output: RegistrationOutput = parse(&activate_impl(&worker).await.unwrap());

        assert_eq!(output.version, "v1");
        assert_eq!(output.state, "active");
        assert_eq!(worker.active_version().await.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_activate_without_waiting_version() {
        let (worker, _network) = crate::tools::testing::worker().await;
        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32012);
    }
}
