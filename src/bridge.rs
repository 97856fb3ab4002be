//! The bridge instance: session lifecycle, discovery passes, device access
//!
//! One bridge owns one optional session with the remote hub and the registry
//! of imported devices. Credential changes drive the state machine
//! `Unconfigured → Authenticating → Discovering → Ready`; a login failure is
//! indistinguishable from never having configured credentials.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::Credentials;
use crate::discovery::{self, ImportedDeviceDescriptor};
use crate::host::DeviceHost;
use crate::registry::DeviceRegistry;
use crate::remote::{RemoteHub, RemoteSession, StreamHandle, StreamOptions};
use crate::{Error, Result};

/// Bridge lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No usable session (no credentials, or the last attempt failed)
    Unconfigured,
    /// Establishing a session with the remote hub
    Authenticating,
    /// Walking the remote device set
    Discovering,
    /// Devices imported and wired
    Ready,
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Discovering => write!(f, "discovering"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Point-in-time bridge status
#[derive(Debug, Clone)]
pub struct BridgeStatus {
    /// Current lifecycle state
    pub state: BridgeState,

    /// Number of imported devices
    pub devices: usize,

    /// Remote-reported hub version, if a session is live
    pub hub_version: Option<String>,
}

/// Bridge between a remote hub and the local device host
pub struct Bridge {
    hub: Arc<dyn RemoteHub>,
    host: Arc<dyn DeviceHost>,
    session: RwLock<Option<Arc<dyn RemoteSession>>>,
    registry: Mutex<DeviceRegistry>,
    state: RwLock<BridgeState>,
}

impl Bridge {
    /// Create a bridge with no session
    #[must_use]
    pub fn new(hub: Arc<dyn RemoteHub>, host: Arc<dyn DeviceHost>) -> Self {
        Self {
            hub,
            host,
            session: RwLock::new(None),
            registry: Mutex::new(DeviceRegistry::new()),
            state: RwLock::new(BridgeState::Unconfigured),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> BridgeState {
        *self.state.read().await
    }

    /// Point-in-time status snapshot
    pub async fn status(&self) -> BridgeStatus {
        let hub_version = self
            .session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.version());
        BridgeStatus {
            state: self.state().await,
            devices: self.registry.lock().await.len(),
            hub_version,
        }
    }

    /// Validate credentials and establish a session with the remote hub
    ///
    /// Any previous session is discarded first; there is no session pooling
    /// and no retry loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] before any network call if a credential
    /// field is empty, [`Error::Auth`] if the hub rejects the login, or
    /// [`Error::Http`] on transport failure. On failure the session is
    /// cleared and the state returns to [`BridgeState::Unconfigured`].
    pub async fn establish_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RemoteSession>> {
        credentials.validate()?;

        self.set_state(BridgeState::Authenticating).await;
        *self.session.write().await = None;

        match self.hub.connect(credentials).await {
            Ok(session) => {
                match session.version() {
                    Some(version) => {
                        tracing::info!(%version, url = %credentials.base_url, "connected to remote hub");
                    }
                    None => {
                        tracing::info!(url = %credentials.base_url, "connected to remote hub");
                    }
                }
                *self.session.write().await = Some(Arc::clone(&session));
                Ok(session)
            }
            Err(e) => {
                self.set_state(BridgeState::Unconfigured).await;
                Err(e)
            }
        }
    }

    /// Full refresh: authenticate, discover, wire, notify the host
    ///
    /// Returns the number of imported devices. Triggered serially by
    /// credential changes or startup; passes never overlap.
    ///
    /// # Errors
    ///
    /// Session-level faults abort the whole pass (no devices are discovered
    /// or registered) and reset the bridge to unconfigured; per-device
    /// faults are contained inside the pass.
    pub async fn refresh(&self, credentials: &Credentials) -> Result<usize> {
        let session = match self.establish_session(credentials).await {
            Ok(session) => session,
            Err(e) => {
                // Incomplete credentials and login failures land in the same
                // place: no session, unconfigured.
                *self.session.write().await = None;
                self.set_state(BridgeState::Unconfigured).await;
                return Err(e);
            }
        };

        self.set_state(BridgeState::Discovering).await;
        let result = {
            let mut registry = self.registry.lock().await;
            discovery::discover_all(&session, &mut registry, &self.host).await
        };

        match result {
            Ok(batch) => {
                self.set_state(BridgeState::Ready).await;
                Ok(batch.len())
            }
            Err(e) => {
                *self.session.write().await = None;
                self.set_state(BridgeState::Unconfigured).await;
                Err(e)
            }
        }
    }

    /// Look up an imported device's descriptor
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDevice`] if the identifier is not registered;
    /// no side effect.
    pub async fn get_device(&self, native_id: &str) -> Result<ImportedDeviceDescriptor> {
        self.registry
            .lock()
            .await
            .get(native_id)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| Error::UnknownDevice(native_id.to_string()))
    }

    /// Release an imported device, removing it and stopping its wiring
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDevice`] if the identifier is not registered.
    pub async fn release_device(&self, native_id: &str) -> Result<()> {
        let entry = self
            .registry
            .lock()
            .await
            .release(native_id)
            .ok_or_else(|| Error::UnknownDevice(native_id.to_string()))?;
        drop(entry);

        tracing::info!(device = %native_id, "device released");
        Ok(())
    }

    /// Request a media stream from an imported device
    ///
    /// Goes through the device's stream interceptor, which forces the
    /// external egress route.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDevice`] for unregistered identifiers, or the
    /// remote entry point's error.
    pub async fn request_stream(
        &self,
        native_id: &str,
        options: Option<StreamOptions>,
    ) -> Result<StreamHandle> {
        // Hold the lock only to locate the entry; the remote call runs on a
        // clone of the interceptor so a pass can't be blocked by a slow
        // stream negotiation.
        let stream = {
            let registry = self.registry.lock().await;
            registry
                .get(native_id)
                .ok_or_else(|| Error::UnknownDevice(native_id.to_string()))?
                .stream
                .clone()
        };

        stream.request_stream(options).await
    }

    async fn set_state(&self, state: BridgeState) {
        *self.state.write().await = state;
    }
}
