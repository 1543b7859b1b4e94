//! SQLite-backed versioned response stores.
//!
//! Each deployment version owns one store of GET responses. Stores are
//! created at install time, written by the fetch strategies, and deleted
//! in bulk when a newer version activates. Access goes through
//! tokio-rusqlite, so every read and write is an await point.

pub mod connection;
pub mod migrations;
pub mod registration;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use stores::{StoreHandle, StoreSummary};
