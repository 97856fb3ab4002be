//! Registry of currently-imported remote devices
//!
//! Maps stable identifiers to live proxy entries. Single-writer discipline:
//! only the discovery flow and explicit release calls mutate it. Created at
//! startup, repopulated per pass; entries for identifiers that vanish from a
//! pass are reconciled away.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::discovery::ImportedDeviceDescriptor;
use crate::proxy::{DeviceWiring, ExternalRouteStream};
use crate::remote::RemoteDevice;

/// A wired, imported device held by the registry
pub struct ProxyEntry {
    /// Descriptor as emitted to the host
    pub descriptor: ImportedDeviceDescriptor,

    /// Remote handle backing the proxy
    pub handle: Arc<dyn RemoteDevice>,

    /// Stream-request interceptor for this device
    pub stream: ExternalRouteStream,

    /// Forwarding tasks; dropped (and thereby aborted) with the entry
    pub wiring: DeviceWiring,

    /// When the device was imported
    pub imported_at: chrono::DateTime<chrono::Utc>,
}

/// Registry of imported devices keyed by stable identifier
#[derive(Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, ProxyEntry>,
}

impl DeviceRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
        }
    }

    /// Register an entry, returning any prior entry for the same identifier
    ///
    /// The returned entry's wiring stops when the caller drops it.
    pub fn insert(&mut self, entry: ProxyEntry) -> Option<ProxyEntry> {
        self.devices
            .insert(entry.descriptor.native_id.clone(), entry)
    }

    /// Get an entry by identifier
    #[must_use]
    pub fn get(&self, native_id: &str) -> Option<&ProxyEntry> {
        self.devices.get(native_id)
    }

    /// Remove an entry, stopping its wiring when dropped
    pub fn release(&mut self, native_id: &str) -> Option<ProxyEntry> {
        self.devices.remove(native_id)
    }

    /// Drop every entry whose identifier is absent from `seen`
    ///
    /// Returns the removed identifiers. Called at the end of each discovery
    /// pass so stale entries do not outlive the devices backing them.
    pub fn reconcile(&mut self, seen: &HashSet<String>) -> Vec<String> {
        let vanished: Vec<String> = self
            .devices
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for id in &vanished {
            self.devices.remove(id);
        }
        vanished
    }

    /// Identifiers of all registered devices
    #[must_use]
    pub fn native_ids(&self) -> Vec<&str> {
        self.devices.keys().map(String::as_str).collect()
    }

    /// Number of registered devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
