//! Version lifecycle: install, activate, supersede.
//!
//! ```text
//! Installing -> Waiting -> Active -> Superseded
//!     |
//!     +-> Redundant (install failed, never current)
//! ```

use futures_util::future::try_join_all;
use offgrid_core::{CacheDb, Error, Request, RequestKey, Response, StoreHandle};
use serde::Serialize;
use tokio::sync::watch;
use url::Url;

use super::clients::Clients;
use crate::fetch::Network;

/// Lifecycle state of one version's controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Waiting,
    Active,
    Superseded,
    Redundant,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Active => "active",
            WorkerState::Superseded => "superseded",
            WorkerState::Redundant => "redundant",
        }
    }
}

/// One deployed version: its manifest, its store, its state.
pub(crate) struct Controller {
    version: String,
    manifest: Vec<Url>,
    store: StoreHandle,
    state: watch::Sender<WorkerState>,
}

impl Controller {
    pub(crate) fn new(db: &CacheDb, version: &str, manifest: Vec<Url>) -> Self {
        Self::with_state(db, version, manifest, WorkerState::Installing)
    }

    /// Controller for a version that was already active before a restart.
    ///
    /// Its store is already populated, so it carries no manifest.
    pub(crate) fn resumed(db: &CacheDb, version: &str) -> Self {
        Self::with_state(db, version, Vec::new(), WorkerState::Active)
    }

    fn with_state(db: &CacheDb, version: &str, manifest: Vec<Url>, state: WorkerState) -> Self {
        Self { version: version.to_string(), manifest, store: db.store(version), state: watch::Sender::new(state) }
    }

    pub(crate) fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub(crate) fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    fn set_state(&self, state: WorkerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::info!(version = %self.version, from = ?previous, to = ?state, "worker state changed");
        }
    }

    /// Fetch every manifest asset and write them into a fresh store.
    ///
    /// All or nothing: a single failed or non-2xx fetch abandons the install
    /// before anything is written, and the controller becomes redundant.
    pub(crate) async fn install(&self, db: &CacheDb, network: &dyn Network) -> Result<(), Error> {
        self.set_state(WorkerState::Installing);

        let fetches = self.manifest.iter().map(|url| async move {
            let request = Request::get(url.clone(), Default::default());
            let response = network.fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::HttpError(format!("{url}: status {}", response.status)));
            }
            Ok::<(RequestKey, Response), Error>((request.key(), response))
        });

        let populated = match try_join_all(fetches).await {
            Ok(entries) => db.populate_store(&self.version, entries).await,
            Err(e) => Err(e),
        };

        match populated {
            Ok(_) => {
                tracing::info!(version = %self.version, assets = self.manifest.len(), "installed");
                self.set_state(WorkerState::Waiting);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(version = %self.version, error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(Error::InstallFailed { version: self.version.clone(), reason: e.to_string() })
            }
        }
    }

    /// Take control: drop every other store and record this version in one
    /// transaction, then claim clients.
    ///
    /// Returns the versions that were deleted.
    pub(crate) async fn activate(&self, db: &CacheDb, clients: Option<&Clients>) -> Result<Vec<String>, Error> {
        let purged = db.activate_store(&self.version).await?;
        for version in &purged {
            tracing::info!(%version, "deleted stale store");
        }
        self.set_state(WorkerState::Active);

        if let Some(clients) = clients {
            clients.claim(&self.version);
        }

        Ok(purged)
    }

    /// A newer version took over; nothing further runs here.
    pub(crate) fn supersede(&self) {
        self.set_state(WorkerState::Superseded);
    }

    /// Parked version replaced before it ever activated.
    pub(crate) fn discard(&self) {
        self.set_state(WorkerState::Redundant);
    }
}
