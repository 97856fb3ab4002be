//! Device discovery: filtering remote devices and running full passes
//!
//! A discovery pass walks the session's system-state snapshot, filters each
//! device against the capability allow-list, wires the survivors, registers
//! them, and notifies the host with the whole batch in one call.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, intersect_allowed};
use crate::host::DeviceHost;
use crate::proxy::{self, ExternalRouteStream};
use crate::registry::{DeviceRegistry, ProxyEntry};
use crate::remote::{RemoteDevice, RemoteSession};
use crate::{Error, Result};

/// Locally-constructed record of an imported remote device
///
/// Derived deterministically from a remote handle; immutable once produced.
/// The capability set is the allow-list intersection, never the device's full
/// declared set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedDeviceDescriptor {
    /// Stable identifier, shared with the remote hub
    pub native_id: String,

    /// Human-readable name
    pub name: String,

    /// Device type
    pub device_type: String,

    /// Pruned capability set, in allow-list order
    pub capabilities: Vec<Capability>,

    /// Metadata as reported by the hub
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Filter one remote device against the capability allow-list
///
/// Returns `None` when the device declares no allow-listed capability; such
/// devices are excluded from the registry and the host notification.
///
/// # Errors
///
/// Propagates [`Error::StaleDevice`] if the handle's identifier cannot be
/// accessed; the caller skips the device without counting it as an
/// unsupported rejection.
pub fn filter_and_describe(handle: &dyn RemoteDevice) -> Result<Option<ImportedDeviceDescriptor>> {
    let native_id = handle.native_id()?;

    let capabilities = intersect_allowed(&handle.capability_tags());
    if capabilities.is_empty() {
        tracing::info!(
            device = %native_id,
            name = %handle.name(),
            "no importable capability, skipping"
        );
        return Ok(None);
    }

    Ok(Some(ImportedDeviceDescriptor {
        native_id,
        name: handle.name(),
        device_type: handle.device_type(),
        capabilities,
        metadata: handle.metadata(),
    }))
}

/// Run a full discovery pass over the session's current device set
///
/// Survivors are wired, registered (overwriting prior entries for the same
/// identifier), and reported to the host as one batch. Identifiers that
/// vanished since the previous pass are released. Per-device faults are
/// contained; only session-level faults abort the pass.
///
/// # Errors
///
/// Returns error if the snapshot cannot be fetched, a non-stale device
/// lookup fails, or the host rejects the batch.
pub async fn discover_all(
    session: &Arc<dyn RemoteSession>,
    registry: &mut DeviceRegistry,
    host: &Arc<dyn DeviceHost>,
) -> Result<Vec<ImportedDeviceDescriptor>> {
    let snapshot = session.system_state().await?;

    let mut survivors: Vec<(ImportedDeviceDescriptor, Arc<dyn RemoteDevice>)> = Vec::new();
    for id in &snapshot.device_ids {
        let handle = match session.device(id).await {
            Ok(handle) => handle,
            Err(Error::StaleDevice(reason)) => {
                tracing::info!(device = %id, %reason, "device unreachable, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };

        match filter_and_describe(handle.as_ref()) {
            Ok(Some(descriptor)) => survivors.push((descriptor, handle)),
            Ok(None) => {}
            Err(Error::StaleDevice(reason)) => {
                tracing::info!(device = %id, %reason, "device handle went stale, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    let mut batch = Vec::new();
    let mut seen = HashSet::new();
    for (descriptor, handle) in survivors {
        match proxy::wire(&descriptor, &handle, host).await {
            Ok(wiring) => {
                seen.insert(descriptor.native_id.clone());
                let replaced = registry.insert(ProxyEntry {
                    descriptor: descriptor.clone(),
                    stream: ExternalRouteStream::new(Arc::clone(&handle)),
                    handle,
                    wiring,
                    imported_at: Utc::now(),
                });
                if replaced.is_some() {
                    tracing::debug!(device = %descriptor.native_id, "replaced registry entry");
                }
                batch.push(descriptor);
            }
            Err(e) => {
                tracing::warn!(
                    device = %descriptor.native_id,
                    error = %e,
                    "wiring failed, device not imported"
                );
            }
        }
    }

    for id in registry.reconcile(&seen) {
        tracing::info!(device = %id, "device no longer reported by hub, released");
    }

    host.on_devices_changed(batch.clone()).await?;

    tracing::info!(
        accepted = batch.len(),
        reported = snapshot.device_ids.len(),
        "discovery pass complete"
    );

    Ok(batch)
}
