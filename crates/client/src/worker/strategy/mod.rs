//! Retrieval strategies.
//!
//! A strategy resolves a GET to a response using the current store and the
//! network. Strategies never fail: storage errors count as misses, network
//! errors fall through to the next tier, and the last tier is the synthetic
//! offline response.

mod cache_first;
mod network_first;

pub(crate) use cache_first::cache_first;
pub(crate) use network_first::network_first;

use std::sync::Arc;

use offgrid_core::{RequestKey, Response, StoreHandle};

use super::background::Background;
use super::{ResponseSource, Served};
use crate::fetch::Network;

/// What a strategy works with for one request.
pub(crate) struct StrategyContext<'a> {
    pub network: &'a Arc<dyn Network>,
    pub store: &'a StoreHandle,
    pub background: &'a Background,
}

/// Store read where a storage failure is a miss.
async fn lookup(store: &StoreHandle, key: &RequestKey) -> Option<Response> {
    match store.get(key).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(version = store.version(), %key, error = %e, "store read failed, treating as miss");
            None
        }
    }
}

/// Store write whose failure is only logged.
async fn store_quietly(store: &StoreHandle, key: &RequestKey, response: &Response) {
    if let Err(e) = store.put(key, response).await {
        tracing::warn!(version = store.version(), %key, error = %e, "store write failed");
    }
}

fn offline(key: &RequestKey) -> Served {
    tracing::debug!(%key, "no store entry and no network, serving offline response");
    Served { response: Response::offline(), source: ResponseSource::Offline }
}
