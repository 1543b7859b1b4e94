//! cache_get tool implementation.
//!
//! Reads one stored entry without touching the network.

use offgrid_client::OfflineWorker;
use offgrid_core::{Error, Method, RequestKey};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// Method the entry was stored under (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Store to read from (default: the active version).
    #[serde(default)]
    pub version: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub version: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &OfflineWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let method = match params.method.as_deref() {
        Some(method) => method.parse::<Method>()?,
        None => Method::Get,
    };

    let version = match params.version {
        Some(version) => version,
        None => worker
            .active_version()
            .await
            .ok_or_else(|| Error::CacheMiss("no active version".into()))?,
    };

    let key = RequestKey::new(method, &url);
    let response = worker
        .db()
        .store(&version)
        .get(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{key} in {version}")))?;

    let output = CacheGetOutput {
        version,
        url: key.url,
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, parse, worker};

    fn params(url: &str) -> CacheGetParams {
        CacheGetParams { url: url.to_string(), method: None, version: None }
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let (worker, _network) = active_worker("v1").await;

        let output: CacheGetOutput = parse(&get_impl(&worker, params("/")).await.unwrap());

        assert_eq!(output.version, "v1");
        assert_eq!(output.url, "https://prices.example/");
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "shell v1");
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let (worker, _network) = active_worker("v1").await;
        let err = get_impl(&worker, params("/api/products")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_unknown_version() {
        let (worker, _network) = active_worker("v1").await;
        let request = CacheGetParams { version: Some("v0".into()), ..params("/") };
        assert!(get_impl(&worker, request).await.is_err());
    }

    #[tokio::test]
    async fn test_get_impl_without_active_version() {
        let (worker, _network) = worker().await;
        let err = get_impl(&worker, params("/")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }
}
