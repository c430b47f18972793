//! Layered process configuration: compiled-in defaults → optional TOML file →
//! environment variables.
//!
//! Every other component is constructed from a single [`ServiceConfig`] built
//! once at startup; nothing downstream re-reads the environment itself.
//! The environment layer is a small, fixed set of named variables (§6), not a
//! generic nested-path scheme, so overrides are applied explicitly rather
//! than through `config`'s automatic key-splitting.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Inbound authentication settings (§3 `AuthConfig (inbound)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub enabled: bool,
    #[serde(default)]
    pub hmac_secret: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    pub rate_limit_per_minute: u32,
    pub burst: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { enabled: true, hmac_secret: None, bearer_token: None, rate_limit_per_minute: 600, burst: 20 }
    }
}

/// Per-process configuration, merged from defaults, an optional file, and
/// the environment. See `SPEC_FULL.md` §10 for the layering contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub listen_addr: String,
    pub auth: AuthSettings,
    #[serde(default)]
    pub asset_search_paths: Vec<PathBuf>,
    pub max_asset_file_size_mb: u64,
    pub max_tracker_entries: usize,
    pub tracker_ttl_secs: u64,
    pub max_operations_per_cycle: usize,
    pub queue_capacity_per_channel: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "scenectl".to_string(),
            listen_addr: "127.0.0.1:8891".to_string(),
            auth: AuthSettings::default(),
            asset_search_paths: Vec::new(),
            max_asset_file_size_mb: 100,
            max_tracker_entries: 1000,
            tracker_ttl_secs: 300,
            max_operations_per_cycle: 2,
            queue_capacity_per_channel: 256,
        }
    }
}

impl ServiceConfig {
    pub fn tracker_ttl(&self) -> Duration {
        Duration::from_secs(self.tracker_ttl_secs)
    }

    /// Loads configuration for `service_name` following the documented
    /// layering: compiled-in defaults, then an optional TOML file named by
    /// `AGENT_EXT_CONFIG_FILE` (falling back to `./agent_world.toml` if it
    /// exists), then the fixed set of environment variables from §6 — each
    /// checked first under its service-specific name (`AGENT_<SERVICE>_*`)
    /// and falling back to the global name (`AGENT_EXT_*`).
    pub fn load(service_name: &str) -> Result<Self, config::ConfigError> {
        let mut cfg = Self::from_file_or_default(service_name)?;
        cfg.apply_env_overrides(service_name);
        Ok(cfg)
    }

    fn from_file_or_default(service_name: &str) -> Result<Self, config::ConfigError> {
        let defaults = ServiceConfig { service_name: service_name.to_string(), ..ServiceConfig::default() };
        let config_file = std::env::var("AGENT_EXT_CONFIG_FILE").ok().map(PathBuf::from).or_else(|| {
            let candidate = PathBuf::from("agent_world.toml");
            candidate.exists().then_some(candidate)
        });
        let Some(path) = config_file else { return Ok(defaults) };

        let defaults_json = serde_json::to_value(&defaults).expect("ServiceConfig defaults always serialize");
        config::Config::builder()
            .add_source(config::Config::try_from(&defaults_json)?)
            .add_source(config::File::from(path).required(false))
            .build()?
            .try_deserialize()
    }

    /// Reads a fixed, named env var, preferring `AGENT_<SERVICE>_<suffix>`
    /// over the global `AGENT_EXT_<suffix>` fallback. Mirrors the original
    /// extension's env-lookup order.
    fn env_var(service_name: &str, suffix: &str) -> Option<String> {
        let service_key = format!("AGENT_{}_{}", service_name.to_uppercase(), suffix);
        std::env::var(service_key).ok().or_else(|| std::env::var(format!("AGENT_EXT_{suffix}")).ok())
    }

    fn apply_env_overrides(&mut self, service_name: &str) {
        if let Some(v) = Self::env_var(service_name, "AUTH_ENABLED") {
            self.auth.enabled = matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on");
        }
        if let Some(v) = Self::env_var(service_name, "AUTH_TOKEN") {
            self.auth.bearer_token = Some(v);
        }
        if let Some(v) = Self::env_var(service_name, "HMAC_SECRET") {
            self.auth.hmac_secret = Some(v);
        }
        if let Some(v) = Self::env_var(service_name, "LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = Self::env_var(service_name, "RATE_LIMIT_PER_MINUTE") {
            if let Ok(n) = v.parse() {
                self.auth.rate_limit_per_minute = n;
            }
        }
    }
}
