use crate::error::{Result, WaystoneError};
use crate::retry::RetryPolicy;
use crate::types::EndpointPool;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "waystone.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoints: Vec<String>, // e.g., "https://192.168.1.20:8443"
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Load from {config_dir}/waystone.json, falling back to `WAYSTONE_*` env vars
    pub fn load_or_default(config_dir: &Path) -> Self {
        let path = config_dir.join(CONFIG_FILE);

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<ClientConfig>(&content) {
                    Ok(config) => {
                        tracing::info!(
                            "Loaded client config: endpoints={}, max_attempts={}",
                            config.endpoints.len(),
                            config.retry.max_attempts
                        );
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse {}: {}, using env", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read {}: {}, using env", CONFIG_FILE, e);
                }
            }
        }

        let config = Self::from_env();
        tracing::info!(
            "No {} loaded, using env: endpoints={}",
            CONFIG_FILE,
            config.endpoints.len()
        );
        config
    }

    /// WAYSTONE_ENDPOINTS (comma-separated), WAYSTONE_MAX_ATTEMPTS,
    /// WAYSTONE_TIMEOUT_MS, WAYSTONE_BASE_DELAY_MS. Unparsable numbers keep
    /// their defaults.
    pub fn from_env() -> Self {
        let endpoints = std::env::var("WAYSTONE_ENDPOINTS")
            .map(|v| split_endpoints(&v))
            .unwrap_or_default();

        let mut retry = RetryPolicy::default();
        if let Some(n) = env_number("WAYSTONE_MAX_ATTEMPTS") {
            retry.max_attempts = n;
        }
        if let Some(n) = env_number("WAYSTONE_TIMEOUT_MS") {
            retry.timeout_ms = n;
        }
        if let Some(n) = env_number("WAYSTONE_BASE_DELAY_MS") {
            retry.base_delay_ms = n;
        }

        Self { endpoints, retry }
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(WaystoneError::Config(
                "No endpoints configured (set WAYSTONE_ENDPOINTS or waystone.json)".into(),
            ));
        }
        self.retry.validate()
    }

    pub fn pool(&self) -> Result<EndpointPool> {
        self.validate()?;
        EndpointPool::new(&self.endpoints)
    }
}

pub fn split_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={}", key, raw);
            None
        }
    }
}
