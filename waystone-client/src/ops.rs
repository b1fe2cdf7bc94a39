use super::types::{FlagRequest, FlagResponse, LinkResponse, RegistrationResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use waystone::{AttemptError, AttemptFuture, Endpoint, Operation};

/// GET /api/link?device_id=..., success when a non-empty `link` comes back
pub struct FetchLink {
    pub http: reqwest::Client,
    pub device_id: Arc<str>,
}

impl Operation for FetchLink {
    type Output = String;

    fn attempt(&self, endpoint: Endpoint) -> AttemptFuture<String> {
        let request = self
            .http
            .get(endpoint.url("api/link"))
            .query(&[("device_id", &*self.device_id)]);

        Box::pin(async move {
            let resp: LinkResponse = send_json(request, &endpoint).await?;
            resp.link
                .filter(|l| !l.is_empty())
                .ok_or_else(|| AttemptError::Rejected(format!("{} returned no link", endpoint)))
        })
    }

    fn name(&self) -> &str {
        "fetch_link"
    }
}

/// GET /api/devices/{device_id}, success when the device is registered
pub struct CheckRegistration {
    pub http: reqwest::Client,
    pub device_id: Arc<str>,
}

impl Operation for CheckRegistration {
    type Output = RegistrationResponse;

    fn attempt(&self, endpoint: Endpoint) -> AttemptFuture<RegistrationResponse> {
        let request = self
            .http
            .get(endpoint.url(&format!(
                "api/devices/{}",
                urlencoding::encode(&self.device_id)
            )));

        Box::pin(async move {
            let resp: RegistrationResponse = send_json(request, &endpoint).await?;
            if !resp.registered {
                return Err(AttemptError::Rejected(format!(
                    "device not registered at {}",
                    endpoint
                )));
            }
            Ok(resp)
        })
    }

    fn name(&self) -> &str {
        "check_registration"
    }
}

/// POST /api/flag, success when the backend reports `success: true`
pub struct UpdateFlag {
    pub http: reqwest::Client,
    pub body: Arc<FlagRequest>,
}

impl Operation for UpdateFlag {
    type Output = ();

    fn attempt(&self, endpoint: Endpoint) -> AttemptFuture<()> {
        let request = self.http.post(endpoint.url("api/flag")).json(&*self.body);

        Box::pin(async move {
            let resp: FlagResponse = send_json(request, &endpoint).await?;
            if !resp.success {
                return Err(AttemptError::Rejected(format!(
                    "{} refused flag update",
                    endpoint
                )));
            }
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "update_flag"
    }
}

/// Send, require 2xx, decode JSON. Every failure maps onto an `AttemptError`.
async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    endpoint: &Endpoint,
) -> Result<T, AttemptError> {
    let response = request
        .send()
        .await
        .map_err(|e| AttemptError::Transport(format!("Failed to reach {}: {}", endpoint, e)))?;

    if !response.status().is_success() {
        return Err(AttemptError::Status(response.status().as_u16()));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AttemptError::Payload(format!("Failed to parse response from {}: {}", endpoint, e)))
}
