//! worker_install tool implementation.
//!
//! Registers a new version: installs its manifest and, unless the worker is
//! configured to wait, activates it right away.

use offgrid_client::{OfflineWorker, Registration};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerInstallParams {
    /// Version label; it also names the version's store.
    pub version: String,

    /// Asset URLs to pre-populate. Defaults to the configured manifest.
    #[serde(default)]
    pub manifest: Option<Vec<String>>,
}

/// Outcome of a register or activate call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegistrationOutput {
    pub version: String,
    /// "active" or "waiting".
    pub state: String,
    /// Stores deleted by activation.
    pub purged: Vec<String>,
}

impl From<Registration> for RegistrationOutput {
    fn from(registration: Registration) -> Self {
        Self {
            version: registration.version,
            state: registration.state.as_str().to_string(),
            purged: registration.purged,
        }
    }
}

pub async fn install_impl(
    worker: &OfflineWorker, default_manifest: &[String], params: WorkerInstallParams,
) -> Result<CallToolResult, McpError> {
    let manifest = params.manifest.as_deref().unwrap_or(default_manifest);
    let registration = worker.register(&params.version, manifest).await?;
    json_result(&RegistrationOutput::from(registration))
}
