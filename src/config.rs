//! Service configuration loading from environment variables.
//!
//! All configuration values are loaded from `INFERD_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without
//! crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `INFERD_MODEL_NAME` | california_housing_model | Registered model name |
//! | `INFERD_MODEL_ALIAS` | production | Registry alias to resolve |
//! | `INFERD_SCAN_ROOTS` | ./model/production | `:`-separated local scan roots |
//! | `INFERD_TRACKING_URI` | http://127.0.0.1:5001 | Registry base URL |
//! | `INFERD_MANIFEST_NAME` | MLmodel | Manifest sentinel file name |
//! | `INFERD_BIND_ADDR` | 0.0.0.0:8000 | HTTP listen address |
//! | `INFERD_REGISTRY_TIMEOUT_SECS` | 10 | Per-strategy registry timeout (secs) |
//! | `INFERD_LOG_FORMAT` | json | Log output format (json, pretty) |
//! | `INFERD_LOG_LEVEL` | info | Log level filter |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::telemetry::{LogConfig, LogFormat};

/// Default manifest sentinel shared by the scanner, resolver and loader.
pub const DEFAULT_MANIFEST_NAME: &str = "MLmodel";

/// All service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Registered model name in the artifact store.
    pub model_name: String,
    /// Alias pointing at the version to serve.
    pub model_alias: String,
    /// Ordered local directories searched before the registry is consulted.
    pub scan_roots: Vec<PathBuf>,
    /// Base URL of the artifact store REST API.
    pub tracking_uri: String,
    /// Manifest sentinel file name.
    pub manifest_name: String,
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
    /// Timeout applied to each registry-backed resolution strategy.
    pub registry_timeout: Duration,
    /// Logging configuration.
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_name: "california_housing_model".to_string(),
            model_alias: "production".to_string(),
            scan_roots: vec![PathBuf::from("./model/production")],
            tracking_uri: "http://127.0.0.1:5001".to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            registry_timeout: Duration::from_secs(10),
            log: LogConfig::default(),
        }
    }
}

/// Read a string env var, returning `default` when missing or empty.
fn parse_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val,
        _ => default.to_string(),
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Split a `:`-separated path list, skipping empty segments.
fn parse_paths(key: &str, default: &str) -> Vec<PathBuf> {
    let raw = parse_string(key, default);
    raw.split(':')
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .collect()
}

fn load_log_config() -> LogConfig {
    let format = match parse_string("INFERD_LOG_FORMAT", "json").to_lowercase().as_str() {
        "pretty" => LogFormat::Pretty,
        _ => LogFormat::Json,
    };
    let level = parse_string("INFERD_LOG_LEVEL", "info");
    LogConfig { format, level }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> ServiceConfig {
    let defaults = ServiceConfig::default();

    let bind_addr = parse_string("INFERD_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .unwrap_or(defaults.bind_addr);

    let timeout_secs = parse_u64("INFERD_REGISTRY_TIMEOUT_SECS", 10).max(1);

    ServiceConfig {
        model_name: parse_string("INFERD_MODEL_NAME", &defaults.model_name),
        model_alias: parse_string("INFERD_MODEL_ALIAS", &defaults.model_alias),
        scan_roots: parse_paths("INFERD_SCAN_ROOTS", "./model/production"),
        tracking_uri: parse_string("INFERD_TRACKING_URI", &defaults.tracking_uri),
        manifest_name: parse_string("INFERD_MANIFEST_NAME", DEFAULT_MANIFEST_NAME),
        bind_addr,
        registry_timeout: Duration::from_secs(timeout_secs),
        log: load_log_config(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "INFERD_MODEL_NAME",
        "INFERD_MODEL_ALIAS",
        "INFERD_SCAN_ROOTS",
        "INFERD_TRACKING_URI",
        "INFERD_MANIFEST_NAME",
        "INFERD_BIND_ADDR",
        "INFERD_REGISTRY_TIMEOUT_SECS",
        "INFERD_LOG_FORMAT",
        "INFERD_LOG_LEVEL",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.model_name, "california_housing_model");
        assert_eq!(cfg.model_alias, "production");
        assert_eq!(cfg.scan_roots, vec![PathBuf::from("./model/production")]);
        assert_eq!(cfg.manifest_name, "MLmodel");
        assert_eq!(cfg.bind_addr.port(), 8000);
        assert_eq!(cfg.registry_timeout.as_secs(), 10);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("INFERD_MODEL_NAME", "rent_model");
        std::env::set_var("INFERD_MODEL_ALIAS", "staging");
        std::env::set_var("INFERD_SCAN_ROOTS", "/srv/models:/var/cache/models");
        std::env::set_var("INFERD_BIND_ADDR", "127.0.0.1:9000");
        std::env::set_var("INFERD_REGISTRY_TIMEOUT_SECS", "3");
        let cfg = load();
        assert_eq!(cfg.model_name, "rent_model");
        assert_eq!(cfg.model_alias, "staging");
        assert_eq!(
            cfg.scan_roots,
            vec![PathBuf::from("/srv/models"), PathBuf::from("/var/cache/models")]
        );
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.registry_timeout.as_secs(), 3);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("INFERD_BIND_ADDR", "not-an-addr");
        std::env::set_var("INFERD_REGISTRY_TIMEOUT_SECS", "abc");
        let cfg = load();
        assert_eq!(cfg.bind_addr.port(), 8000);
        assert_eq!(cfg.registry_timeout.as_secs(), 10);
        clear_env_vars();
    }

    #[test]
    fn test_registry_timeout_floor() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("INFERD_REGISTRY_TIMEOUT_SECS", "0");
        let cfg = load();
        assert!(cfg.registry_timeout.as_secs() >= 1, "timeout must have floor");
        clear_env_vars();
    }

    #[test]
    fn test_empty_scan_roots_segment_skipped() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("INFERD_SCAN_ROOTS", "/a::/b:");
        let cfg = load();
        assert_eq!(cfg.scan_roots, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        clear_env_vars();
    }

    #[test]
    fn test_log_format_parsing() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("INFERD_LOG_FORMAT", "pretty");
        let cfg = load();
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        std::env::set_var("INFERD_LOG_FORMAT", "unknown");
        let cfg = load();
        assert_eq!(cfg.log.format, LogFormat::Json);
        clear_env_vars();
    }
}
