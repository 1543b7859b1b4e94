//! Client code for offgrid.
//!
//! This crate provides the network fetch client and the offline worker that
//! decides, per intercepted request, whether to answer from a versioned
//! store, from the network, or with the synthetic offline response.

pub mod fetch;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use worker::{
    ControllerChange, ControllerInfo, OfflineWorker, Registration, ResponseSource, Route, Served, WorkerPolicy,
    WorkerState, WorkerStatus,
};
