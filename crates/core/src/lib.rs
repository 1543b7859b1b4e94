//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - The versioned response store with SQLite backend
//! - Request and response model shared by the worker and the server
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, StoreHandle, StoreSummary};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Destination, Method, Request, RequestKey};
pub use response::{OFFLINE_BODY, Response};
