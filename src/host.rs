//! Local device manager seam
//!
//! The host hub receives descriptor batches after each discovery pass and
//! the forwarded state/events of every wired device. [`MemoryHost`] is the
//! in-process implementation used by the daemon and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::capability::Capability;
use crate::discovery::ImportedDeviceDescriptor;
use crate::Result;

/// A generic device event as dispatched to the host
#[derive(Debug, Clone)]
pub struct DeviceEvent {
    /// Stable identifier of the originating device
    pub native_id: String,

    /// Capability interface the event is tagged with
    pub capability: Capability,

    /// Event payload
    pub payload: serde_json::Value,
}

/// Local device manager the bridge proxies devices onto
#[async_trait]
pub trait DeviceHost: Send + Sync {
    /// Receive the full batch of imported descriptors for a discovery pass
    ///
    /// Called once per pass with every survivor, never incrementally.
    ///
    /// # Errors
    ///
    /// Returns error if the host cannot accept the batch.
    async fn on_devices_changed(&self, batch: Vec<ImportedDeviceDescriptor>) -> Result<()>;

    /// Write a property value into a device's local state slot
    ///
    /// Last-write-wins; no versioning.
    async fn set_device_state(&self, native_id: &str, property: &str, value: serde_json::Value);

    /// Dispatch a generic device event tagged with its interface
    ///
    /// Every event is dispatched; no de-duplication or coalescing.
    async fn emit_device_event(
        &self,
        native_id: &str,
        capability: Capability,
        payload: serde_json::Value,
    );
}

/// In-memory host: state slots, an event log, and the received batches
#[derive(Default)]
pub struct MemoryHost {
    state: RwLock<HashMap<String, HashMap<String, serde_json::Value>>>,
    events: RwLock<Vec<DeviceEvent>>,
    batches: RwLock<Vec<Vec<ImportedDeviceDescriptor>>>,
}

impl MemoryHost {
    /// Create an empty host
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one state slot of a device
    pub async fn state_value(&self, native_id: &str, property: &str) -> Option<serde_json::Value> {
        self.state
            .read()
            .await
            .get(native_id)
            .and_then(|slots| slots.get(property))
            .cloned()
    }

    /// Snapshot a device's full state
    pub async fn device_state(&self, native_id: &str) -> HashMap<String, serde_json::Value> {
        self.state
            .read()
            .await
            .get(native_id)
            .cloned()
            .unwrap_or_default()
    }

    /// All generic events dispatched so far, in order
    pub async fn events(&self) -> Vec<DeviceEvent> {
        self.events.read().await.clone()
    }

    /// The most recent descriptor batch, if any pass has completed
    pub async fn last_batch(&self) -> Option<Vec<ImportedDeviceDescriptor>> {
        self.batches.read().await.last().cloned()
    }

    /// Number of batches received
    pub async fn batch_count(&self) -> usize {
        self.batches.read().await.len()
    }
}

#[async_trait]
impl DeviceHost for MemoryHost {
    async fn on_devices_changed(&self, batch: Vec<ImportedDeviceDescriptor>) -> Result<()> {
        tracing::debug!(devices = batch.len(), "host notified of device batch");
        self.batches.write().await.push(batch);
        Ok(())
    }

    async fn set_device_state(&self, native_id: &str, property: &str, value: serde_json::Value) {
        self.state
            .write()
            .await
            .entry(native_id.to_string())
            .or_default()
            .insert(property.to_string(), value);
    }

    async fn emit_device_event(
        &self,
        native_id: &str,
        capability: Capability,
        payload: serde_json::Value,
    ) {
        self.events.write().await.push(DeviceEvent {
            native_id: native_id.to_string(),
            capability,
            payload,
        });
    }
}
