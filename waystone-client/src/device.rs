/// Supplies the stable per-device identifier sent to the backend.
pub trait DeviceIdentity: Send + Sync {
    /// `None` when the platform cannot produce an identifier right now.
    fn device_id(&self) -> Option<String>;
}

/// Uses the machine hostname, overridable with WAYSTONE_DEVICE_ID.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostnameIdentity;

impl DeviceIdentity for HostnameIdentity {
    fn device_id(&self) -> Option<String> {
        if let Ok(id) = std::env::var("WAYSTONE_DEVICE_ID") {
            if !id.trim().is_empty() {
                return Some(id.trim().to_string());
            }
        }
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
    }
}

/// Fixed identifier (or none at all).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl DeviceIdentity for StaticIdentity {
    fn device_id(&self) -> Option<String> {
        self.0.clone().filter(|id| !id.is_empty())
    }
}
