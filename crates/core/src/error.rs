//! Unified error types for offgrid.
//!
//! Each variant's display string starts with a stable code that the MCP
//! surface forwards to callers.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the offgrid worker and server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No stored entry for the given request.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored headers could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response where a successful one was required.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Transport failure: unreachable host, DNS failure, reset connection.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Attempt to store a non-GET request or a non-2xx response.
    #[error("NOT_CACHEABLE: {0}")]
    NotCacheable(String),

    /// A manifest asset could not be fetched; the version was not installed.
    #[error("INSTALL_FAILED: {version}: {reason}")]
    InstallFailed { version: String, reason: String },

    /// `skip_waiting` was requested but no installed version is parked.
    #[error("NO_WAITING_WORKER")]
    NoWaitingWorker,

    /// Refused to delete the store currently serving requests.
    #[error("STORE_ACTIVE: {0}")]
    StoreActive(String),
}

impl Error {
    /// True for transport-level failures that strategies answer with a fallback.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::Network(msg) => (-32009, msg.clone()),
            Error::NotCacheable(msg) => (-32010, msg.clone()),
            Error::InstallFailed { .. } => (-32011, err.to_string()),
            Error::NoWaitingWorker => (-32012, "No installed version is waiting".to_string()),
            Error::StoreActive(msg) => (-32013, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("GET https://example.com/".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("https://example.com/"));
    }

    #[test]
    fn test_install_failed_display() {
        let err = Error::InstallFailed { version: "v2".into(), reason: "status 404".into() };
        assert_eq!(err.to_string(), "INSTALL_FAILED: v2: status 404");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::CacheMiss("abc123".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);

        let mcp_err: McpError = Error::NoWaitingWorker.into();
        assert_eq!(mcp_err.code.0, -32012);
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::Network("reset".into()).is_transport());
        assert!(Error::FetchTimeout("20s".into()).is_transport());
        assert!(!Error::HttpError("status 404".into()).is_transport());
        assert!(!Error::NotCacheable("POST".into()).is_transport());
    }
}
