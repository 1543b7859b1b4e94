//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFGRID_*)
//! 2. TOML config file (if OFFGRID_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Worker configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFGRID_*)
/// 2. TOML config file (if OFFGRID_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding every store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that root-relative paths (manifest entries, tool inputs) resolve against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Store version identifier of the deployed build.
    ///
    /// Supplied by the deploy process; compared by exact string equality.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Assets fetched into the store at install time, in order.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// URL substrings that mark a request as an API call (network-first).
    #[serde(default = "default_api_markers")]
    pub api_markers: Vec<String>,

    /// Activate a freshly installed version without waiting for open clients to close.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Notify already-open clients when a version activates.
    #[serde(default = "default_true")]
    pub claim_clients: bool,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offgrid-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_version() -> String {
    "offgrid-v1".into()
}

fn default_manifest() -> Vec<String> {
    ["/", "/index.html", "/static/js/bundle.js", "/manifest.json", "/favicon.ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_api_markers() -> Vec<String> {
    vec!["/api/".into(), "firestore".into()]
}

fn default_user_agent() -> String {
    "offgrid/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            manifest: default_manifest(),
            api_markers: default_api_markers(),
            skip_waiting: true,
            claim_clients: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed origin. Valid after [`AppConfig::validate`].
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// List values can be given in the environment as TOML arrays, e.g.
    /// `OFFGRID_MANIFEST='["/", "/app.js"]'`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFGRID_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./offgrid-cache.sqlite"));
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.cache_version, "offgrid-v1");
        assert_eq!(config.manifest.first().map(String::as_str), Some("/"));
        assert_eq!(config.api_markers, vec!["/api/".to_string(), "firestore".to_string()]);
        assert!(config.skip_waiting);
        assert!(config.claim_clients);
        assert_eq!(config.user_agent, "offgrid/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig { origin: "https://prices.example".into(), ..Default::default() };
        assert_eq!(config.origin_url().unwrap().host_str(), Some("prices.example"));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                cache_version = "build-42"
                manifest = ["/", "/shell.js"]
                skip_waiting = false
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.cache_version, "build-42");
        assert_eq!(config.manifest, vec!["/".to_string(), "/shell.js".to_string()]);
        assert!(!config.skip_waiting);
        assert!(config.claim_clients);
    }
}
