//! Proxy wiring: forwarding remote device behavior onto the local host
//!
//! Wiring a device subscribes to each of its pruned capabilities and spawns
//! one forwarding task per feed. Property events land in local state slots;
//! everything else is dispatched as a generic device event. Stream requests
//! go through [`ExternalRouteStream`], which forces the external egress
//! route before delegating to the remote entry point.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::capability::Capability;
use crate::discovery::ImportedDeviceDescriptor;
use crate::host::DeviceHost;
use crate::remote::{RemoteDevice, StreamHandle, StreamOptions, StreamRoute};
use crate::Result;

/// State slot written by battery events and the fixed-state seed
pub const BATTERY_LEVEL_PROPERTY: &str = "batteryLevel";

/// Live forwarding tasks for one wired device
///
/// Dropping the wiring aborts every task, so tearing down a registry entry
/// also stops its forwarding. Re-wiring a device therefore never leaves two
/// sets of subscriptions live.
#[derive(Debug, Default)]
pub struct DeviceWiring {
    tasks: Vec<JoinHandle<()>>,
}

impl DeviceWiring {
    /// Number of live forwarding tasks
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for DeviceWiring {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Stream-request interceptor forcing the external egress route
///
/// The remote side may rebroadcast streams through multiple egress paths;
/// forcing `route = external` ensures the host receives a connection
/// reachable from outside the remote hub's network. The interceptor is a
/// distinct wrapper type, so wrapped state is carried by the type system and
/// a handle can never be double-wrapped.
#[derive(Clone)]
pub struct ExternalRouteStream {
    inner: Arc<dyn RemoteDevice>,
}

impl ExternalRouteStream {
    /// Wrap a remote device's stream-request entry point
    #[must_use]
    pub fn new(inner: Arc<dyn RemoteDevice>) -> Self {
        Self { inner }
    }

    /// Request a stream, forcing `route = external`
    ///
    /// Caller options (or defaults, when none are supplied) are delegated
    /// with only the route overridden; the result is returned unmodified.
    ///
    /// # Errors
    ///
    /// Propagates the remote entry point's error.
    pub async fn request_stream(&self, options: Option<StreamOptions>) -> Result<StreamHandle> {
        let mut options = options.unwrap_or_default();
        options.route = Some(StreamRoute::External);
        self.inner.request_stream(options).await
    }
}

/// Wire one imported device: subscribe, forward, seed fixed state
///
/// # Errors
///
/// Returns error if any capability subscription cannot be established; the
/// caller excludes the device from the registry and the host batch.
pub async fn wire(
    descriptor: &ImportedDeviceDescriptor,
    handle: &Arc<dyn RemoteDevice>,
    host: &Arc<dyn DeviceHost>,
) -> Result<DeviceWiring> {
    let mut tasks = Vec::with_capacity(descriptor.capabilities.len());

    for capability in descriptor.capabilities.iter().copied() {
        let mut feed = handle.subscribe(capability).await?;
        let host = Arc::clone(host);
        let native_id = descriptor.native_id.clone();

        tasks.push(tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                match event.property {
                    Some(property) => {
                        host.set_device_state(&native_id, &property, event.payload)
                            .await;
                    }
                    None => {
                        host.emit_device_event(&native_id, event.capability, event.payload)
                            .await;
                    }
                }
            }
            tracing::debug!(device = %native_id, capability = %capability, "event feed closed");
        }));
    }

    // Battery state is not event-driven at subscribe time; seed the slot so
    // it isn't blank until the first change event arrives.
    if descriptor.capabilities.contains(&Capability::Battery) {
        match handle.battery_level().await {
            Ok(Some(level)) => {
                host.set_device_state(
                    &descriptor.native_id,
                    BATTERY_LEVEL_PROPERTY,
                    serde_json::json!(level),
                )
                .await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    device = %descriptor.native_id,
                    error = %e,
                    "failed to seed battery level"
                );
            }
        }
    }

    tracing::debug!(
        device = %descriptor.native_id,
        capabilities = descriptor.capabilities.len(),
        "device wired"
    );

    Ok(DeviceWiring { tasks })
}
