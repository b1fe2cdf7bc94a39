use super::device::DeviceIdentity;
use super::ops::{CheckRegistration, FetchLink, UpdateFlag};
use super::prefs::{PreferenceStore, ACCOUNT_ID_KEY};
use super::types::{FlagRequest, Registration};
use std::sync::Arc;
use waystone::{ClientConfig, Notifier, Result, RetryCoordinator, WaystoneError};
use waystone_tls::TlsConfig;

pub const LINK_NOTICE: &str = "Could not reach the server to fetch your link. Check your network and try again.";
pub const REGISTRATION_NOTICE: &str =
    "Could not confirm this device's registration. Check your network and try again.";

/// Backend calls routed through the failover engine.
pub struct BackendClient {
    coordinator: RetryCoordinator,
    http: reqwest::Client,
    identity: Arc<dyn DeviceIdentity>,
    prefs: Arc<dyn PreferenceStore>,
}

impl BackendClient {
    pub fn new(
        config: &ClientConfig,
        tls: &TlsConfig,
        identity: Arc<dyn DeviceIdentity>,
        prefs: Arc<dyn PreferenceStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let coordinator =
            RetryCoordinator::new(config.pool()?, config.retry.clone())?.with_notifier(notifier);
        let http = tls
            .build_client()
            .map_err(|e| WaystoneError::Transport(e.to_string()))?;

        Ok(Self::from_parts(coordinator, http, identity, prefs))
    }

    pub fn from_parts(
        coordinator: RetryCoordinator,
        http: reqwest::Client,
        identity: Arc<dyn DeviceIdentity>,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            coordinator,
            http,
            identity,
            prefs,
        }
    }

    pub fn coordinator(&self) -> &RetryCoordinator {
        &self.coordinator
    }

    fn device_id(&self) -> Result<Arc<str>> {
        self.identity
            .device_id()
            .map(Arc::from)
            .ok_or_else(|| WaystoneError::MissingPrecondition("device identifier unavailable".into()))
    }

    /// Fetch this device's link. Notifies the user if every endpoint stays unreachable.
    pub async fn fetch_link(&self) -> Result<String> {
        let device_id = self.device_id()?;
        let op = FetchLink {
            http: self.http.clone(),
            device_id,
        };
        self.coordinator.execute_primary(op, LINK_NOTICE).await
    }

    /// Confirm the device is registered and remember the account it belongs to.
    /// The registration is returned even if storing the account id fails.
    pub async fn check_registration(&self) -> Result<Registration> {
        let device_id = self.device_id()?;
        let op = CheckRegistration {
            http: self.http.clone(),
            device_id: Arc::clone(&device_id),
        };
        let resp = self
            .coordinator
            .execute_primary(op, REGISTRATION_NOTICE)
            .await?;

        if let Some(account_id) = resp.account_id.as_deref() {
            match self.prefs.put(ACCOUNT_ID_KEY, account_id) {
                Ok(()) => tracing::info!("Stored account id for device {}", device_id),
                Err(e) => tracing::error!(
                    "Failed to store account id for device {}: {}",
                    device_id,
                    e
                ),
            }
        }

        Ok(Registration {
            device_id: device_id.to_string(),
            account_id: resp.account_id,
        })
    }

    /// Update the device flag. Failures are returned silently.
    pub async fn set_flag(&self, enabled: bool) -> Result<()> {
        let device_id = self.device_id()?;
        let op = UpdateFlag {
            http: self.http.clone(),
            body: Arc::new(FlagRequest {
                device_id: device_id.to_string(),
                enabled,
            }),
        };
        self.coordinator.execute(op).await
    }
}
