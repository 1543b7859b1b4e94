//! Stored copy first, refreshed in the background.

use offgrid_core::Request;

use super::{StrategyContext, lookup, offline, store_quietly};
use crate::worker::{ResponseSource, Served};

/// Serve the stored copy immediately and refresh it opportunistically.
///
/// On a hit a detached fetch overwrites the entry if the network answers
/// 2xx; its failures are dropped. On a miss the network is awaited and a
/// 2xx answer is stored before returning.
pub(crate) async fn cache_first(ctx: StrategyContext<'_>, request: &Request) -> Served {
    let key = request.key();

    if let Some(cached) = lookup(ctx.store, &key).await {
        tracing::debug!(%key, "store hit, revalidating in background");

        let network = ctx.network.clone();
        let store = ctx.store.clone();
        let request = request.clone();
        ctx.background.spawn(async move {
            match network.fetch(&request).await {
                Ok(fresh) if fresh.is_success() => store_quietly(&store, &request.key(), &fresh).await,
                Ok(fresh) => tracing::debug!(url = %request.url, status = fresh.status, "revalidation kept stored copy"),
                Err(e) => tracing::debug!(url = %request.url, error = %e, "revalidation failed"),
            }
        });

        return Served { response: cached, source: ResponseSource::Cache };
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                store_quietly(ctx.store, &key, &response).await;
            }
            Served { response, source: ResponseSource::Network }
        }
        Err(e) => {
            tracing::debug!(%key, error = %e, "store miss and network failed");
            offline(&key)
        }
    }
}
