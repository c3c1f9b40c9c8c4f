//! TrafficSplit configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use trafficsplit_common::{ConfigError, RatioConfig, DEFAULT_REDIS_URL, DEFAULT_STORE_TIMEOUT_MS};

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "TRAFFICSPLIT";

/// Allocator service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficSplitConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Prefix for counter hash keys; none keeps the cycle key as-is
    pub key_prefix: Option<String>,
    /// Deadline for each counter store batch
    pub store_timeout_ms: u64,
    /// Target id → `"numerator/denominator"`
    pub fractions: BTreeMap<String, String>,
}

impl Default for TrafficSplitConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: None,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            fractions: BTreeMap::new(),
        }
    }
}

impl TrafficSplitConfig {
    /// Load configuration from `.env`, an optional file, and the environment
    ///
    /// Environment variables win over the file. `TRAFFICSPLIT_FRACTIONS`
    /// is a JSON object, e.g. `{"a": "1/2", "b": "1/2"}`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }
        let mut cfg: Self = builder
            .build()
            .context("Failed to read TrafficSplit settings")?
            .try_deserialize()
            .context("Failed to deserialize TrafficSplit settings")?;

        if let Ok(url) = std::env::var(format!("{}_REDIS_URL", ENV_PREFIX)) {
            cfg.redis_url = url;
        }
        if let Ok(prefix) = std::env::var(format!("{}_KEY_PREFIX", ENV_PREFIX)) {
            cfg.key_prefix = Some(prefix).filter(|p| !p.is_empty());
        }
        if let Ok(val) = std::env::var(format!("{}_STORE_TIMEOUT_MS", ENV_PREFIX)) {
            cfg.store_timeout_ms = val
                .parse()
                .with_context(|| format!("Invalid {}_STORE_TIMEOUT_MS: {}", ENV_PREFIX, val))?;
        }
        if let Ok(raw) = std::env::var(format!("{}_FRACTIONS", ENV_PREFIX)) {
            cfg.fractions = parse_fractions_json(&raw)?;
        }

        Ok(cfg)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validated ratio map built from `fractions`
    pub fn ratio_config(&self) -> std::result::Result<RatioConfig, ConfigError> {
        RatioConfig::parse(self.fractions.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Parse `{"id": "1/4", ...}`
pub fn parse_fractions_json(raw: &str) -> Result<BTreeMap<String, String>> {
    serde_json::from_str(raw).context("TRAFFICSPLIT_FRACTIONS must be a JSON object of strings")
}
