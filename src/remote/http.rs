//! HTTP client for the remote hub API
//!
//! Authenticates with username/password against the hub's JSON login
//! endpoint, then talks bearer-authenticated JSON for snapshots, device
//! lookup, and stream requests. Device event feeds are consumed as streamed
//! JSON lines.

use std::sync::Arc;

use futures::StreamExt;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

use crate::capability::Capability;
use crate::config::Credentials;
use crate::{Error, Result};

use super::{
    RemoteDevice, RemoteEvent, RemoteHub, RemoteSession, StreamHandle, StreamOptions, SystemState,
};

/// Capacity of per-capability event channels
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Connection factory for hubs speaking the HTTP API
pub struct HttpRemoteHub;

impl HttpRemoteHub {
    /// Create a new hub client factory
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for HttpRemoteHub {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    devices: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceResponse {
    id: String,
    name: String,
    #[serde(rename = "type")]
    device_type: String,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatteryResponse {
    level: f64,
}

/// One line of a device event feed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    #[serde(default)]
    property: Option<String>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[async_trait::async_trait]
impl RemoteHub for HttpRemoteHub {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteSession>> {
        let base = Url::parse(&credentials.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL: {e}")))?;

        // Local-network hubs commonly present self-signed certificates;
        // accepting them is a deliberate trust relaxation for LAN
        // deployments, not an oversight.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        let response = client
            .post(endpoint(&base, "api/login")?)
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!(
                "hub rejected login for user '{}'",
                credentials.username
            )));
        }

        let login: LoginResponse = response.error_for_status()?.json().await?;

        Ok(Arc::new(HttpSession {
            client,
            base,
            token: login.token,
            version: login.version,
        }))
    }
}

/// Authenticated session against an HTTP hub
struct HttpSession {
    client: reqwest::Client,
    base: Url,
    token: String,
    version: Option<String>,
}

#[async_trait::async_trait]
impl RemoteSession for HttpSession {
    fn version(&self) -> Option<String> {
        self.version.clone()
    }

    async fn system_state(&self) -> Result<SystemState> {
        let state: StateResponse = self
            .client
            .get(endpoint(&self.base, "api/state")?)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(SystemState {
            device_ids: state.devices,
        })
    }

    async fn device(&self, id: &str) -> Result<Arc<dyn RemoteDevice>> {
        let response = self
            .client
            .get(endpoint(&self.base, &format!("api/devices/{id}"))?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(Error::StaleDevice(format!(
                "hub no longer exposes device '{id}'"
            )));
        }

        let info: DeviceResponse = response.error_for_status()?.json().await?;

        Ok(Arc::new(HttpDevice {
            client: self.client.clone(),
            base: self.base.clone(),
            token: self.token.clone(),
            info,
        }))
    }
}

/// Handle to one device behind an HTTP session
struct HttpDevice {
    client: reqwest::Client,
    base: Url,
    token: String,
    info: DeviceResponse,
}

#[async_trait::async_trait]
impl RemoteDevice for HttpDevice {
    fn native_id(&self) -> Result<String> {
        Ok(self.info.id.clone())
    }

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn device_type(&self) -> String {
        self.info.device_type.clone()
    }

    fn capability_tags(&self) -> Vec<String> {
        self.info.capabilities.clone()
    }

    fn metadata(&self) -> serde_json::Value {
        self.info.metadata.clone()
    }

    async fn subscribe(&self, capability: Capability) -> Result<mpsc::Receiver<RemoteEvent>> {
        let url = endpoint(&self.base, &format!("api/devices/{}/events", self.info.id))?;
        let response = self
            .client
            .get(url)
            .query(&[("capability", capability.tag())])
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let device = self.info.id.clone();

        drop(tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buf: Vec<u8> = Vec::new();

            'feed: while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                buf.extend_from_slice(&chunk);

                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<EventRecord>(line) {
                        Ok(record) => {
                            let event = RemoteEvent {
                                capability,
                                property: record.property,
                                payload: record.payload,
                            };
                            if tx.send(event).await.is_err() {
                                // Receiver gone - the wiring was torn down
                                break 'feed;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                device = %device,
                                error = %e,
                                "skipping malformed event line"
                            );
                        }
                    }
                }
            }

            tracing::debug!(device = %device, capability = %capability, "event feed ended");
        }));

        Ok(rx)
    }

    async fn battery_level(&self) -> Result<Option<f64>> {
        let response = self
            .client
            .get(endpoint(
                &self.base,
                &format!("api/devices/{}/battery", self.info.id),
            )?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let battery: BatteryResponse = response.error_for_status()?.json().await?;
        Ok(Some(battery.level))
    }

    async fn request_stream(&self, options: StreamOptions) -> Result<StreamHandle> {
        let handle: StreamHandle = self
            .client
            .post(endpoint(
                &self.base,
                &format!("api/devices/{}/stream", self.info.id),
            )?)
            .bearer_auth(&self.token)
            .json(&options)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(handle)
    }
}

fn endpoint(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| Error::Config(format!("invalid endpoint '{path}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_relative_paths() {
        let base = Url::parse("https://hub.local:9443").unwrap();
        let url = endpoint(&base, "api/login").unwrap();
        assert_eq!(url.as_str(), "https://hub.local:9443/api/login");
    }

    #[test]
    fn event_record_without_property() {
        let record: EventRecord =
            serde_json::from_str(r#"{"payload": {"motion": true}}"#).unwrap();
        assert!(record.property.is_none());
        assert_eq!(record.payload["motion"], true);
    }

    #[test]
    fn stream_options_serialize_flattened_extras() {
        let mut options = StreamOptions::default();
        options
            .extra
            .insert("container".to_string(), serde_json::json!("mp4"));
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({"container": "mp4"}));
    }
}
