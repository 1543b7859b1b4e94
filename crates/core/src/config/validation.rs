//! Sanity checks run on a freshly loaded [`AppConfig`].
//!
//! Anything that would only surface later as a confusing fetch or install
//! failure is rejected here, at startup.

use std::ops::RangeInclusive;

use crate::config::AppConfig;
use thiserror::Error;

const BYTES_RANGE: RangeInclusive<usize> = 1..=50 * 1024 * 1024;
const TIMEOUT_RANGE: RangeInclusive<u64> = 100..=300_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Reject settings the worker cannot run with.
    ///
    /// `cache_version` being blank is reported as [`ConfigError::Missing`];
    /// every other problem (byte or timeout limits out of range, blank user
    /// agent, non-http(s) origin, blank manifest entries or API markers) as
    /// [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !BYTES_RANGE.contains(&self.max_bytes) {
            return Err(invalid("max_bytes", "must be between 1 byte and 50MB"));
        }
        if !TIMEOUT_RANGE.contains(&self.timeout_ms) {
            return Err(invalid("timeout_ms", "must be between 100ms and 5 minutes (300000ms)"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "scheme must be http or https"));
        }

        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set OFFGRID_CACHE_VERSION to the deployed build identifier".into(),
            });
        }

        if self.manifest.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid("manifest", "entries must not be empty"));
        }
        if self.manifest.is_empty() {
            tracing::warn!("manifest is empty; install will create an empty store");
        }

        if self.api_markers.iter().any(|marker| marker.is_empty()) {
            return Err(invalid("api_markers", "markers must not be empty"));
        }

        if !self.skip_waiting {
            tracing::info!("skip_waiting disabled; new versions wait for an explicit activation");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_field(config: AppConfig) -> Option<String> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_defaults_pass() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_byte_limit() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("max_bytes"));

        let config = AppConfig { max_bytes: 64 * 1024 * 1024, ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("timeout_ms"));
    }

    #[test]
    fn test_validate_blank_user_agent() {
        let config = AppConfig { user_agent: " ".into(), ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("user_agent"));
    }

    #[test]
    fn test_validate_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("origin"));

        let config = AppConfig { origin: "ftp://files.example".into(), ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("origin"));
    }

    #[test]
    fn test_validate_missing_cache_version() {
        let config = AppConfig { cache_version: "  ".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_empty_manifest_entry() {
        let config = AppConfig { manifest: vec!["/".into(), "".into()], ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("manifest"));
    }

    #[test]
    fn test_validate_empty_marker() {
        let config = AppConfig { api_markers: vec![String::new()], ..Default::default() };
        assert_eq!(rejected_field(config).as_deref(), Some("api_markers"));
    }

    #[test]
    fn test_lower_bounds_and_empty_manifest_pass() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, manifest: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
