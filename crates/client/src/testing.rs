//! Scripted network for worker tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use offgrid_core::{Error, Request, Response};
use tokio::sync::Semaphore;

#[derive(Clone)]
enum Scripted {
    Respond(Response),
    Fail,
}

/// Answers by exact URL. Unscripted URLs fail like an unreachable host.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        let response = Response::new(status, body.to_string()).with_header("content-type", "text/plain");
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Respond(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Fail);
    }

    /// Make every fetch of `url` wait until a permit is added to the returned gate.
    pub(crate) fn hold(&self, url: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().unwrap().insert(url.to_string(), Arc::clone(&gate));
        gate
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl crate::Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        let gate = self.gates.lock().unwrap().get(&url).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }

        let scripted = self.routes.lock().unwrap().get(&url).cloned();
        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) | None => Err(Error::Network(format!("{url}: connection refused"))),
        }
    }
}
