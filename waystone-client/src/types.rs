use serde::{Deserialize, Serialize};

/// Response from GET /api/link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    #[serde(default)]
    pub link: Option<String>,
}

/// Response from GET /api/devices/{device_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub registered: bool,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Body of POST /api/flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagRequest {
    pub device_id: String,
    pub enabled: bool,
}

/// Response from POST /api/flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagResponse {
    pub success: bool,
}

/// Outcome of a successful registration check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub device_id: String,
    pub account_id: Option<String>,
}
