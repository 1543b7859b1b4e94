//! The offline worker.
//!
//! Every request from the hosted application goes through
//! [`OfflineWorker::handle`]. Non-GET requests go straight to the network.
//! GETs are routed to one strategy, which answers from the active version's
//! store, the network, or the synthetic offline response.
//!
//! Versions move through [`WorkerState`]: a new version is installed from
//! its asset manifest, then activated (immediately when `skip_waiting` is
//! set), which deletes every other store and claims open clients.

mod background;
mod clients;
mod dispatch;
mod lifecycle;
mod strategy;

use std::sync::Arc;

use offgrid_core::{AppConfig, CacheDb, Error, Request, Response, StoreSummary};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use url::Url;

pub use clients::ControllerChange;
pub use dispatch::{RequestClass, Route, classify, route};
pub use lifecycle::WorkerState;

use background::Background;
use clients::Clients;
use lifecycle::Controller;
use strategy::StrategyContext;

use crate::fetch::{Network, resolve};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Offline,
    Passthrough,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
            ResponseSource::Passthrough => "passthrough",
        }
    }
}

/// A response handed back to the page.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// Rollout and routing policy.
#[derive(Debug, Clone)]
pub struct WorkerPolicy {
    /// Activate right after install instead of waiting for [`OfflineWorker::skip_waiting`].
    pub skip_waiting: bool,
    /// Broadcast a [`ControllerChange`] on activation.
    pub claim_clients: bool,
    /// URL substrings routed network-first.
    pub api_markers: Vec<String>,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self { skip_waiting: true, claim_clients: true, api_markers: vec!["/api/".into(), "firestore".into()] }
    }
}

impl From<&AppConfig> for WorkerPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            skip_waiting: config.skip_waiting,
            claim_clients: config.claim_clients,
            api_markers: config.api_markers.clone(),
        }
    }
}

/// Version and state of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerInfo {
    pub version: String,
    pub state: WorkerState,
}

/// Snapshot of the worker for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub active: Option<ControllerInfo>,
    pub waiting: Option<ControllerInfo>,
    pub stores: Vec<StoreSummary>,
    pub background_tasks: usize,
}

/// Outcome of a register or skip-waiting call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub version: String,
    pub state: WorkerState,
    /// Stores deleted by activation.
    pub purged: Vec<String>,
}

pub struct OfflineWorker {
    db: CacheDb,
    network: Arc<dyn Network>,
    origin: Url,
    policy: WorkerPolicy,
    active: RwLock<Option<Arc<Controller>>>,
    waiting: Mutex<Option<Arc<Controller>>>,
    /// Serializes register / activate.
    lifecycle: Mutex<()>,
    clients: Clients,
    background: Background,
}

impl OfflineWorker {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, origin: Url, policy: WorkerPolicy) -> Self {
        Self {
            db,
            network,
            origin,
            policy,
            active: RwLock::new(None),
            waiting: Mutex::new(None),
            lifecycle: Mutex::new(()),
            clients: Clients::new(),
            background: Background::default(),
        }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve a possibly root-relative URL against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        Ok(resolve(&self.origin, input)?)
    }

    /// Version currently serving requests.
    pub async fn active_version(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|c| c.version().to_string())
    }

    /// Controller-change notifications for an open client.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerChange> {
        self.clients.subscribe()
    }

    /// Re-adopt the persisted active version after a restart.
    ///
    /// Returns the resumed version, or `None` when nothing was active or its
    /// store no longer exists.
    pub async fn resume(&self) -> Result<Option<String>, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let Some(version) = self.db.active_version().await? else {
            return Ok(None);
        };
        if !self.db.list_versions().await?.contains(&version) {
            tracing::warn!(%version, "recorded active version has no store, not resuming");
            return Ok(None);
        }

        *self.active.write().await = Some(Arc::new(Controller::resumed(&self.db, &version)));
        tracing::info!(%version, "resumed active version");
        Ok(Some(version))
    }

    /// Install `version` from `manifest`, then activate it or park it as waiting.
    ///
    /// On failure the previously active version stays in control.
    pub async fn register(&self, version: &str, manifest: &[String]) -> Result<Registration, Error> {
        if version.trim().is_empty() {
            return Err(Error::InvalidInput("version must not be empty".into()));
        }
        let manifest = self.resolve_manifest(manifest)?;

        let _lifecycle = self.lifecycle.lock().await;

        if self.active_version().await.as_deref() == Some(version) {
            tracing::debug!(version, "version already active, nothing to install");
            return Ok(Registration { version: version.to_string(), state: WorkerState::Active, purged: Vec::new() });
        }

        let controller = Arc::new(Controller::new(&self.db, version, manifest));
        controller.install(&self.db, self.network.as_ref()).await?;

        if self.policy.skip_waiting {
            let purged = self.activate(&controller).await?;
            return Ok(Registration { version: version.to_string(), state: controller.state(), purged });
        }

        if let Some(previous) = self.waiting.lock().await.replace(Arc::clone(&controller)) {
            previous.discard();
        }
        Ok(Registration { version: version.to_string(), state: controller.state(), purged: Vec::new() })
    }

    /// Activate the waiting version now.
    pub async fn skip_waiting(&self) -> Result<Registration, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let controller = self.waiting.lock().await.take().ok_or(Error::NoWaitingWorker)?;
        let purged = self.activate(&controller).await?;
        Ok(Registration { version: controller.version().to_string(), state: controller.state(), purged })
    }

    /// Caller holds the lifecycle lock.
    async fn activate(&self, controller: &Arc<Controller>) -> Result<Vec<String>, Error> {
        let previous = self.active.write().await.replace(Arc::clone(controller));

        let clients = self.policy.claim_clients.then_some(&self.clients);
        match controller.activate(&self.db, clients).await {
            Ok(purged) => {
                if let Some(previous) = previous
                    && previous.version() != controller.version()
                {
                    previous.supersede();
                }
                Ok(purged)
            }
            Err(e) => {
                tracing::warn!(version = controller.version(), error = %e, "activation failed, restoring previous version");
                *self.active.write().await = previous;
                controller.discard();
                if let Err(cleanup) = self.db.delete_store(controller.version()).await {
                    tracing::warn!(version = controller.version(), error = %cleanup, "could not delete abandoned store");
                }
                Err(e)
            }
        }
    }

    /// Delete stores no controller uses: `version` alone, or every stale one.
    ///
    /// The active and the waiting store are refused with [`Error::StoreActive`].
    pub async fn purge(&self, version: Option<&str>) -> Result<Vec<String>, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let mut in_use = Vec::new();
        if let Some(active) = self.active.read().await.as_ref() {
            in_use.push(active.version().to_string());
        }
        if let Some(waiting) = self.waiting.lock().await.as_ref() {
            in_use.push(waiting.version().to_string());
        }

        let targets: Vec<String> = match version {
            Some(version) if in_use.iter().any(|v| v == version) => {
                return Err(Error::StoreActive(version.to_string()));
            }
            Some(version) => vec![version.to_string()],
            None => self.db.list_versions().await?.into_iter().filter(|v| !in_use.contains(v)).collect(),
        };

        let mut purged = Vec::new();
        for version in targets {
            if self.db.delete_store(&version).await? {
                tracing::info!(%version, "purged store");
                purged.push(version);
            }
        }
        Ok(purged)
    }

    fn resolve_manifest(&self, manifest: &[String]) -> Result<Vec<Url>, Error> {
        manifest.iter().map(|entry| self.resolve(entry)).collect()
    }

    /// Answer one intercepted request.
    ///
    /// Only a pass-through request can fail, with the same transport error
    /// the page would have seen without a worker.
    pub async fn handle(&self, request: Request) -> Result<Served, Error> {
        let route = dispatch::route(&request, &self.policy.api_markers);
        let active = self.active.read().await.clone();

        let controller = match (route, active) {
            (Route::Passthrough, _) | (_, None) => {
                tracing::debug!(method = %request.method, url = %request.url, "passing through");
                let response = self.network.fetch(&request).await?;
                return Ok(Served { response, source: ResponseSource::Passthrough });
            }
            (_, Some(controller)) => controller,
        };

        tracing::debug!(url = %request.url, ?route, version = controller.version(), "dispatching");
        let ctx = StrategyContext { network: &self.network, store: controller.store(), background: &self.background };

        let served = match route {
            Route::NetworkFirst => strategy::network_first(ctx, &request).await,
            _ => strategy::cache_first(ctx, &request).await,
        };
        Ok(served)
    }

    /// Wait for every background store write to finish.
    pub async fn settle(&self) {
        self.background.settle().await;
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let info = |c: &Arc<Controller>| ControllerInfo { version: c.version().to_string(), state: c.state() };
        let active = self.active.read().await.as_ref().map(info);
        let waiting = self.waiting.lock().await.as_ref().map(info);

        Ok(WorkerStatus {
            active,
            waiting,
            stores: self.db.store_summaries().await?,
            background_tasks: self.background.in_flight(),
        })
    }
}
