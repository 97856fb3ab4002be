//! Device capability tags and the import allow-list
//!
//! Remote devices declare capability interfaces as string tags. The bridge
//! only imports devices that declare at least one allow-listed capability,
//! and descriptors carry the intersection in allow-list order.

use serde::{Deserialize, Serialize};

/// A capability interface a device may implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Live video streaming
    VideoCamera,
    /// Still image snapshots
    StillCamera,
    /// WebRTC-style signaling channel
    SignalingChannel,
    /// Battery level reporting
    Battery,
    /// Motion detection events
    MotionSensor,
}

/// Capabilities the bridge is willing to import, in priority order.
///
/// Descriptors list capabilities in this order regardless of the order the
/// remote device declared them. Process-wide constant, not configurable.
pub const ALLOWED_CAPABILITIES: [Capability; 5] = [
    Capability::VideoCamera,
    Capability::StillCamera,
    Capability::SignalingChannel,
    Capability::Battery,
    Capability::MotionSensor,
];

impl Capability {
    /// The wire tag for this capability (e.g. `"video-camera"`)
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::VideoCamera => "video-camera",
            Self::StillCamera => "still-camera",
            Self::SignalingChannel => "signaling-channel",
            Self::Battery => "battery",
            Self::MotionSensor => "motion-sensor",
        }
    }

    /// Parse a wire tag into a capability
    ///
    /// Returns `None` for tags the bridge does not model (e.g. `"thermostat"`);
    /// such tags can never match the allow-list.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "video-camera" => Some(Self::VideoCamera),
            "still-camera" => Some(Self::StillCamera),
            "signaling-channel" => Some(Self::SignalingChannel),
            "battery" => Some(Self::Battery),
            "motion-sensor" => Some(Self::MotionSensor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Intersect a device's declared capability tags with the allow-list.
///
/// The result preserves allow-list order, not the declared order. Unknown
/// tags are ignored. An empty result means the device is not importable.
#[must_use]
pub fn intersect_allowed(declared: &[String]) -> Vec<Capability> {
    ALLOWED_CAPABILITIES
        .into_iter()
        .filter(|cap| declared.iter().any(|tag| tag == cap.tag()))
        .collect()
}
