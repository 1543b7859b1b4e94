//! Controller-change notifications for open clients.

use serde::Serialize;
use tokio::sync::broadcast;

/// Sent to every open client when a version takes control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerChange {
    pub version: String,
}

pub(crate) struct Clients {
    tx: broadcast::Sender<ControllerChange>,
}

impl Clients {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ControllerChange> {
        self.tx.subscribe()
    }

    /// Make `version` authoritative for every open client. Returns how many were told.
    pub(crate) fn claim(&self, version: &str) -> usize {
        let notified = self.tx.send(ControllerChange { version: version.to_string() }).unwrap_or(0);
        tracing::info!(version, clients = notified, "claimed clients");
        notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_reaches_subscribers() {
        let clients = Clients::new();
        let mut first = clients.subscribe();
        let mut second = clients.subscribe();

        assert_eq!(clients.claim("v2"), 2);

        assert_eq!(first.recv().await.unwrap().version, "v2");
        assert_eq!(second.recv().await.unwrap().version, "v2");
    }

    #[test]
    fn test_claim_without_clients() {
        let clients = Clients::new();
        assert_eq!(clients.claim("v1"), 0);
    }
}
