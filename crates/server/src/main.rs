//! offgrid server entry point.
//!
//! Boots the offline worker and exposes it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offgrid_client::{FetchClient, FetchConfig, OfflineWorker, WorkerPolicy};
use offgrid_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, "Starting offgrid on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(OfflineWorker::new(
        db,
        Arc::new(network),
        config.origin_url()?,
        WorkerPolicy::from(&config),
    ));

    worker.resume().await?;
    if worker.active_version().await.as_deref() != Some(config.cache_version.as_str()) {
        match worker.register(&config.cache_version, &config.manifest).await {
            Ok(registration) => {
                tracing::info!(version = %registration.version, state = registration.state.as_str(), "registered")
            }
            Err(e) => tracing::warn!(error = %e, "initial install failed, serving without a new version"),
        }
    }

    let handler = handler::OffgridServer::new(Arc::clone(&worker), config.manifest.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    worker.settle().await;
    tracing::info!("background writes settled, exiting");

    Ok(())
}
