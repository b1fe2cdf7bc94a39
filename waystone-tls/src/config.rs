use crate::error::{Result, TlsError};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_USER_AGENT: &str = concat!("waystone/", env!("CARGO_PKG_VERSION"));

/// How endpoint certificates are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Accept any certificate. Backends in this deployment serve
    /// self-signed certificates on addresses that change per install.
    #[default]
    AcceptAny,
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub trust: TrustPolicy,
    pub user_agent: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            trust: TrustPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TlsConfig {
    /// Load transport configuration from environment variables.
    ///
    /// Optional: WAYSTONE_TLS_VERIFY (1/true/yes to verify certificates, default off)
    /// Optional: WAYSTONE_USER_AGENT
    pub fn from_env() -> Result<Self> {
        let trust = match env::var("WAYSTONE_TLS_VERIFY") {
            Ok(raw) => parse_verify_flag(&raw)?,
            Err(_) => TrustPolicy::default(),
        };

        let user_agent = env::var("WAYSTONE_USER_AGENT")
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self { trust, user_agent })
    }

    /// Build the HTTP client shared by every attempt.
    ///
    /// Attempts are time-bounded by the retry engine, so no request timeout
    /// is set here.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(self.user_agent.clone());

        if self.trust == TrustPolicy::AcceptAny {
            tracing::warn!("[TLS] certificate verification disabled for backend endpoints");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}

fn parse_verify_flag(raw: &str) -> Result<TrustPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(TrustPolicy::Verify),
        "0" | "false" | "no" => Ok(TrustPolicy::AcceptAny),
        other => Err(TlsError::Config(format!(
            "Invalid WAYSTONE_TLS_VERIFY: {}",
            other
        ))),
    }
}
