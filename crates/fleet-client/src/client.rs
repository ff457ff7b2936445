//! Fleet HTTP client implementation

use std::collections::BTreeMap;
use std::time::Duration;

use fleet_core::{Action, Device};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{FleetClientError, Result};
use crate::events::EventStream;
use crate::types::*;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fleet REST API client
#[derive(Debug, Clone)]
pub struct FleetClient {
    client: Client,
    /// Same settings without a request timeout, for long-lived streams
    stream_client: Client,
    base_url: Url,
}

impl FleetClient {
    /// Create a new fleet client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the fleet server (e.g., "http://localhost:50051")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new fleet client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        let stream_client = Client::builder().connect_timeout(connect_timeout).build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            stream_client,
            base_url,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Health Check
    // =========================================================================

    /// Check server health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("/health")?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    // =========================================================================
    // Device Operations
    // =========================================================================

    /// List all registered devices
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let url = self.base_url.join("/fleet/v1/devices")?;
        debug!("Listing devices from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response::<DeviceList>(response)
            .await
            .map(|r| r.items)
    }

    /// Register a new device
    #[instrument(skip(self), fields(device_id = %request.id))]
    pub async fn register_device(&self, request: &RegisterDeviceRequest) -> Result<Device> {
        let url = self.base_url.join("/fleet/v1/devices")?;
        let response = self.client.post(url).json(request).send().await?;
        self.handle_response(response).await
    }

    /// Get a single device
    #[instrument(skip(self))]
    pub async fn get_device(&self, device_id: &str) -> Result<Device> {
        let url = self.device_url(device_id, "")?;
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Set a device's status, returning the previous and new status
    #[instrument(skip(self))]
    pub async fn set_device_status(
        &self,
        device_id: &str,
        status: &str,
    ) -> Result<UpdateStatusResponse> {
        let url = self.device_url(device_id, "/status")?;
        let request = UpdateStatusRequest {
            status: status.to_string(),
        };
        let response = self.client.put(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Action Operations
    // =========================================================================

    /// Start an action on a device; returns the RUNNING snapshot
    #[instrument(skip(self, params))]
    pub async fn initiate_action(
        &self,
        device_id: &str,
        action_type: &str,
        params: BTreeMap<String, String>,
    ) -> Result<Action> {
        let url = self.device_url(device_id, "/actions")?;
        let request = InitiateActionRequest {
            action_type: action_type.to_string(),
            params,
        };
        let response = self.client.post(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    /// List actions ever started on a device
    #[instrument(skip(self))]
    pub async fn list_device_actions(&self, device_id: &str) -> Result<Vec<Action>> {
        let url = self.device_url(device_id, "/actions")?;
        let response = self.client.get(url).send().await?;
        self.handle_response::<ActionList>(response)
            .await
            .map(|r| r.items)
    }

    /// Get the current snapshot of an action
    #[instrument(skip(self))]
    pub async fn get_action(&self, action_id: &str) -> Result<Action> {
        let mut url = self.base_url.join("/fleet/v1/actions/")?;
        url.path_segments_mut()
            .map_err(|_| FleetClientError::ParseError("base URL cannot be a base".into()))?
            .pop_if_empty()
            .push(action_id);
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Poll an action until it reaches a terminal state
    #[instrument(skip(self))]
    pub async fn wait_for_action(&self, action_id: &str, interval: Duration) -> Result<Action> {
        loop {
            let action = self.get_action(action_id).await?;
            if action.is_terminal() {
                return Ok(action);
            }
            tokio::time::sleep(interval).await;
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Follow action events, optionally for one device only
    #[instrument(skip(self))]
    pub async fn events(&self, device_id: Option<&str>) -> Result<EventStream> {
        let mut url = self.base_url.join("/fleet/v1/events")?;
        if let Some(id) = device_id {
            url.query_pairs_mut().append_pair("device_id", id);
        }
        debug!("Connecting to event stream: {}", url);

        let response = self
            .stream_client
            .get(url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }
        Ok(EventStream::new(response.bytes_stream()))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// `/fleet/v1/devices/<id><suffix>` with the id percent-encoded
    fn device_url(&self, device_id: &str, suffix: &str) -> Result<Url> {
        let mut url = self.base_url.join("/fleet/v1/devices/")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FleetClientError::ParseError("base URL cannot be a base".into()))?;
            segments.pop_if_empty().push(device_id);
            for part in suffix.split('/').filter(|p| !p.is_empty()) {
                segments.push(part);
            }
        }
        Ok(url)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| FleetClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    /// Extract error from failed response
    async fn extract_error(&self, response: reqwest::Response) -> FleetClientError {
        let status = response.status();
        self.extract_error_from_status(response, status).await
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> FleetClientError {
        // Try to parse error response body
        let (kind, message) = match response.json::<ErrorResponse>().await {
            Ok(err) => (err.error, err.message),
            Err(_) => (String::new(), format!("HTTP {}", status)),
        };

        match status {
            StatusCode::NOT_FOUND => {
                if message.starts_with("Action") {
                    FleetClientError::ActionNotFound(message)
                } else if message.starts_with("Device") {
                    FleetClientError::DeviceNotFound(message)
                } else {
                    FleetClientError::server_error(status.as_u16(), message)
                }
            }
            StatusCode::CONFLICT => FleetClientError::Conflict(message),
            StatusCode::BAD_REQUEST if kind == "bad_request" => {
                FleetClientError::InvalidRequest(message)
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FleetClientError::Timeout,
            _ => FleetClientError::server_error(status.as_u16(), message),
        }
    }
}
