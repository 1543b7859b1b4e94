//! Network first, store second, offline response last.

use offgrid_core::Request;

use super::{StrategyContext, lookup, offline, store_quietly};
use crate::worker::{ResponseSource, Served};

/// Prefer the live network; fall back to whatever the store holds.
///
/// A successful response is written to the store in the background and
/// returned without waiting for the write. Non-2xx responses are returned
/// as-is and never stored.
pub(crate) async fn network_first(ctx: StrategyContext<'_>, request: &Request) -> Served {
    let key = request.key();

    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                let store = ctx.store.clone();
                let copy = response.clone();
                let key = key.clone();
                ctx.background.spawn(async move { store_quietly(&store, &key, &copy).await });
            }
            Served { response, source: ResponseSource::Network }
        }
        Err(e) => {
            tracing::debug!(%key, error = %e, "network failed, trying store");
            match lookup(ctx.store, &key).await {
                Some(response) => Served { response, source: ResponseSource::Cache },
                None => offline(&key),
            }
        }
    }
}
