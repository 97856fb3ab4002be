//! Proxy wiring integration tests

mod common;

use std::sync::Arc;

use common::{MockDevice, MockHub, MockSession, credentials, settle};
use lumen_bridge::{
    Bridge, Capability, MemoryHost, RemoteEvent, StreamOptions, StreamRoute,
};

fn setup(devices: Vec<Arc<MockDevice>>) -> (Bridge, Arc<MemoryHost>) {
    let session = Arc::new(MockSession::new(devices));
    let hub = Arc::new(MockHub::new(session));
    let host = Arc::new(MemoryHost::new());
    let bridge = Bridge::new(hub, Arc::clone(&host) as Arc<dyn lumen_bridge::DeviceHost>);
    (bridge, host)
}

#[tokio::test]
async fn battery_level_is_seeded_before_any_event() {
    let camera = Arc::new(
        MockDevice::new("cam-1", "Porch", &["video-camera", "battery"]).with_battery(77.0),
    );
    let (bridge, host) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();
    settle().await;

    assert_eq!(
        host.state_value("cam-1", "batteryLevel").await,
        Some(serde_json::json!(77.0))
    );
}

#[tokio::test]
async fn property_events_write_state_slots() {
    let camera = Arc::new(
        MockDevice::new("cam-1", "Porch", &["video-camera", "battery"]).with_battery(80.0),
    );
    let (bridge, host) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();
    settle().await;

    camera
        .push_event(RemoteEvent {
            capability: Capability::Battery,
            property: Some("batteryLevel".to_string()),
            payload: serde_json::json!(42.0),
        })
        .await;
    settle().await;

    assert_eq!(
        host.state_value("cam-1", "batteryLevel").await,
        Some(serde_json::json!(42.0))
    );
}

#[tokio::test]
async fn non_property_events_forward_as_device_events() {
    let camera = Arc::new(MockDevice::new(
        "cam-1",
        "Porch",
        &["video-camera", "motion-sensor"],
    ));
    let (bridge, host) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();
    settle().await;

    camera
        .push_event(RemoteEvent {
            capability: Capability::MotionSensor,
            property: None,
            payload: serde_json::json!({ "detected": true }),
        })
        .await;
    settle().await;

    let events = host.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].native_id, "cam-1");
    assert_eq!(events[0].capability, Capability::MotionSensor);
    assert_eq!(events[0].payload["detected"], true);
}

#[tokio::test]
async fn stream_request_without_options_forces_external_route() {
    let camera = Arc::new(MockDevice::new("cam-1", "Porch", &["video-camera"]));
    let (bridge, _) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();

    let handle = bridge.request_stream("cam-1", None).await.unwrap();
    assert_eq!(handle.url, "rtsp://relay.example/stream-1");

    let recorded = camera.recorded_stream_options().await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].route, Some(StreamRoute::External));
    assert!(recorded[0].extra.is_empty());
}

#[tokio::test]
async fn stream_request_preserves_other_caller_options() {
    let camera = Arc::new(MockDevice::new("cam-1", "Porch", &["video-camera"]));
    let (bridge, _) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();

    let mut options = StreamOptions::default();
    options.route = Some(StreamRoute::Internal);
    options
        .extra
        .insert("container".to_string(), serde_json::json!("mp4"));

    bridge
        .request_stream("cam-1", Some(options))
        .await
        .unwrap();

    let recorded = camera.recorded_stream_options().await;
    assert_eq!(recorded[0].route, Some(StreamRoute::External));
    assert_eq!(recorded[0].extra["container"], "mp4");
    assert_eq!(recorded[0].extra.len(), 1);
}

#[tokio::test]
async fn rewiring_does_not_double_forward_events() {
    let camera = Arc::new(MockDevice::new(
        "cam-1",
        "Porch",
        &["video-camera", "motion-sensor"],
    ));
    let (bridge, host) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();
    bridge.refresh(&credentials()).await.unwrap();
    settle().await;

    // Two passes made two subscriptions, but only the second is live
    assert_eq!(
        camera.subscription_count(Capability::MotionSensor).await,
        2
    );

    let delivered = camera
        .push_event(RemoteEvent {
            capability: Capability::MotionSensor,
            property: None,
            payload: serde_json::json!({ "detected": true }),
        })
        .await;
    settle().await;

    assert_eq!(delivered, 1);
    assert_eq!(host.events().await.len(), 1);
}

#[tokio::test]
async fn released_device_stops_forwarding() {
    let camera = Arc::new(MockDevice::new(
        "cam-1",
        "Porch",
        &["video-camera", "motion-sensor"],
    ));
    let (bridge, host) = setup(vec![Arc::clone(&camera)]);

    bridge.refresh(&credentials()).await.unwrap();
    settle().await;

    bridge.release_device("cam-1").await.unwrap();
    settle().await;

    let delivered = camera
        .push_event(RemoteEvent {
            capability: Capability::MotionSensor,
            property: None,
            payload: serde_json::json!({ "detected": true }),
        })
        .await;
    settle().await;

    assert_eq!(delivered, 0);
    assert!(host.events().await.is_empty());
}
