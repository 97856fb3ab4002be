//! Remote hub client seam
//!
//! The bridge talks to the remote hub exclusively through these traits. The
//! shipped implementation is [`http::HttpRemoteHub`]; tests substitute mocks.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::capability::Capability;
use crate::config::Credentials;
use crate::{Error, Result};

/// Snapshot of the remote hub's current device set
///
/// Iteration order is the snapshot's native order; it is not guaranteed to be
/// deterministic across servers.
#[derive(Debug, Clone)]
pub struct SystemState {
    /// Stable identifiers of every device the hub currently exposes
    pub device_ids: Vec<String>,
}

/// An event emitted by a remote device capability
#[derive(Debug, Clone)]
pub struct RemoteEvent {
    /// Capability interface the event belongs to
    pub capability: Capability,

    /// Named property this event updates, if any. Events without a property
    /// are forwarded to the host as generic device events.
    pub property: Option<String>,

    /// Event payload (new property value, or event data)
    pub payload: serde_json::Value,
}

/// Egress route for a media stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRoute {
    /// Address reachable only inside the remote hub's network
    Internal,
    /// Address reachable from outside the remote hub's network
    External,
    /// Direct peer connection
    Direct,
}

/// Caller-supplied options for a stream request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamOptions {
    /// Requested egress route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<StreamRoute>,

    /// Remaining options, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Handle to a negotiated media stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamHandle {
    /// Stream URL
    pub url: String,

    /// Container format, if the hub reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Connection factory for the remote hub
#[async_trait]
pub trait RemoteHub: Send + Sync {
    /// Open an authenticated session against the remote registry
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the hub rejects the login and
    /// [`Error::Http`] on transport failure.
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteSession>>;
}

/// A live authenticated session with the remote registry
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Remote-reported hub version, recorded for diagnostics
    fn version(&self) -> Option<String>;

    /// Fetch the current system-state snapshot
    ///
    /// # Errors
    ///
    /// Returns error on transport failure; such a failure aborts the whole
    /// discovery pass.
    async fn system_state(&self) -> Result<SystemState>;

    /// Look up a device handle by its stable identifier
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleDevice`] if the identifier is no longer backed
    /// by a reachable device.
    async fn device(&self, id: &str) -> Result<Arc<dyn RemoteDevice>>;
}

/// Opaque handle to a device living in the remote registry
///
/// Owned by the session; invalidated when the session is torn down.
#[async_trait]
pub trait RemoteDevice: Send + Sync {
    /// Stable identifier
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleDevice`] if the underlying remote connection
    /// has been lost. Such devices are skipped during discovery.
    fn native_id(&self) -> Result<String>;

    /// Human-readable device name
    fn name(&self) -> String;

    /// Device type (e.g. `"camera"`, `"doorbell"`)
    fn device_type(&self) -> String;

    /// Capability interface tags the device declares, in declared order
    fn capability_tags(&self) -> Vec<String>;

    /// Device metadata as reported by the hub
    fn metadata(&self) -> serde_json::Value;

    /// Subscribe to the event/property-change feed for one capability
    ///
    /// The receiver yields events until the remote feed closes.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription cannot be established.
    async fn subscribe(&self, capability: Capability) -> Result<mpsc::Receiver<RemoteEvent>>;

    /// Current battery level, for devices with the battery capability
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    async fn battery_level(&self) -> Result<Option<f64>> {
        Ok(None)
    }

    /// Request a media stream, for devices with the video-camera capability
    ///
    /// # Errors
    ///
    /// Returns error if the device does not stream or the request fails.
    async fn request_stream(&self, options: StreamOptions) -> Result<StreamHandle> {
        let _ = options;
        Err(Error::Remote("device does not support streaming".to_string()))
    }
}
