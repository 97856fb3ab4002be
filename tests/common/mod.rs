//! Shared test fixtures: a scriptable mock hub, session, and devices
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use lumen_bridge::{
    Capability, Credentials, Error, RemoteDevice, RemoteEvent, RemoteHub, RemoteSession, Result,
    StreamHandle, StreamOptions, SystemState,
};

/// A scriptable remote device
pub struct MockDevice {
    pub id: String,
    pub name: String,
    pub device_type: String,
    pub tags: Vec<String>,
    stale: bool,
    battery: Option<f64>,
    subscriptions: Mutex<Vec<(Capability, mpsc::Sender<RemoteEvent>)>>,
    stream_requests: Mutex<Vec<StreamOptions>>,
}

impl MockDevice {
    pub fn new(id: &str, name: &str, tags: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            device_type: "camera".to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            stale: false,
            battery: None,
            subscriptions: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        }
    }

    /// Make `native_id` raise an access fault
    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    pub fn with_battery(mut self, level: f64) -> Self {
        self.battery = Some(level);
        self
    }

    /// Push an event into every live subscription for its capability.
    ///
    /// Returns how many subscriptions actually received it (torn-down
    /// wiring counts as zero).
    pub async fn push_event(&self, event: RemoteEvent) -> usize {
        let subscriptions = self.subscriptions.lock().await;
        let mut delivered = 0;
        for (capability, tx) in subscriptions.iter() {
            if *capability == event.capability && tx.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Total subscriptions ever made for a capability (live or torn down)
    pub async fn subscription_count(&self, capability: Capability) -> usize {
        self.subscriptions
            .lock()
            .await
            .iter()
            .filter(|(c, _)| *c == capability)
            .count()
    }

    /// Options recorded by `request_stream`, in call order
    pub async fn recorded_stream_options(&self) -> Vec<StreamOptions> {
        self.stream_requests.lock().await.clone()
    }
}

#[async_trait]
impl RemoteDevice for MockDevice {
    fn native_id(&self) -> Result<String> {
        if self.stale {
            Err(Error::StaleDevice(format!("'{}' is unreachable", self.id)))
        } else {
            Ok(self.id.clone())
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn device_type(&self) -> String {
        self.device_type.clone()
    }

    fn capability_tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "room": "porch" })
    }

    async fn subscribe(&self, capability: Capability) -> Result<mpsc::Receiver<RemoteEvent>> {
        let (tx, rx) = mpsc::channel(16);
        self.subscriptions.lock().await.push((capability, tx));
        Ok(rx)
    }

    async fn battery_level(&self) -> Result<Option<f64>> {
        Ok(self.battery)
    }

    async fn request_stream(&self, options: StreamOptions) -> Result<StreamHandle> {
        self.stream_requests.lock().await.push(options);
        Ok(StreamHandle {
            url: "rtsp://relay.example/stream-1".to_string(),
            container: Some("mpegts".to_string()),
        })
    }
}

/// A mock session over a mutable device list
pub struct MockSession {
    pub version: Option<String>,
    devices: Mutex<Vec<Arc<MockDevice>>>,
}

impl MockSession {
    pub fn new(devices: Vec<Arc<MockDevice>>) -> Self {
        Self {
            version: Some("2.4.1".to_string()),
            devices: Mutex::new(devices),
        }
    }

    /// Drop a device from the snapshot, as if it left the remote hub
    pub async fn remove_device(&self, id: &str) {
        self.devices.lock().await.retain(|d| d.id != id);
    }
}

#[async_trait]
impl RemoteSession for MockSession {
    fn version(&self) -> Option<String> {
        self.version.clone()
    }

    async fn system_state(&self) -> Result<SystemState> {
        let device_ids = self
            .devices
            .lock()
            .await
            .iter()
            .map(|d| d.id.clone())
            .collect();
        Ok(SystemState { device_ids })
    }

    async fn device(&self, id: &str) -> Result<Arc<dyn RemoteDevice>> {
        let devices = self.devices.lock().await;
        let device = devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::StaleDevice(format!("no device '{id}'")))?;
        Ok(device)
    }
}

/// A mock hub that hands out one session, optionally rejecting logins
pub struct MockHub {
    session: Arc<MockSession>,
    fail_auth: bool,
    connect_calls: AtomicUsize,
}

impl MockHub {
    pub fn new(session: Arc<MockSession>) -> Self {
        Self {
            session,
            fail_auth: false,
            connect_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting_logins(session: Arc<MockSession>) -> Self {
        Self {
            session,
            fail_auth: true,
            connect_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `connect` was attempted
    pub fn connect_count(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteHub for MockHub {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteSession>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_auth {
            return Err(Error::Auth(format!(
                "hub rejected login for user '{}'",
                credentials.username
            )));
        }

        let session: Arc<dyn RemoteSession> =
            Arc::clone(&self.session) as Arc<dyn RemoteSession>;
        Ok(session)
    }
}

/// Complete credentials accepted by the mock hub
pub fn credentials() -> Credentials {
    Credentials::new("https://hub.local:9443", "bridge", "hunter2")
}

/// Let spawned forwarding tasks (and aborted ones) settle
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
