//! Lumen Bridge - imports devices from a remote Lumen hub onto a local one
//!
//! The bridge connects to a remote hub, discovers the subset of its devices
//! that declare allow-listed capabilities, and re-exposes them as local
//! proxy devices, forwarding state changes and events as they happen.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Remote Lumen Hub                    │
//! │   Cameras  │  Doorbells  │  Sensors  │  ...         │
//! └────────────────────┬────────────────────────────────┘
//!                      │ authenticated session
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Lumen Bridge                        │
//! │   Session  │  Filter  │  Wiring  │  Registry        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ descriptors + state + events
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Local Device Host                    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod capability;
pub mod config;
pub mod daemon;
pub mod discovery;
pub mod error;
pub mod host;
pub mod proxy;
pub mod registry;
pub mod remote;

pub use bridge::{Bridge, BridgeState, BridgeStatus};
pub use capability::{ALLOWED_CAPABILITIES, Capability, intersect_allowed};
pub use config::{Credentials, Setting, SettingsStore};
pub use daemon::Daemon;
pub use discovery::{ImportedDeviceDescriptor, discover_all, filter_and_describe};
pub use error::{Error, Result};
pub use host::{DeviceEvent, DeviceHost, MemoryHost};
pub use proxy::{BATTERY_LEVEL_PROPERTY, DeviceWiring, ExternalRouteStream, wire};
pub use registry::{DeviceRegistry, ProxyEntry};
pub use remote::http::HttpRemoteHub;
pub use remote::{
    RemoteDevice, RemoteEvent, RemoteHub, RemoteSession, StreamHandle, StreamOptions, StreamRoute,
    SystemState,
};
