// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end lifecycle tests over the in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use homie_device::transport::{MemoryTransport, Qos};
use homie_device::{
    Datatype, Device, DeviceConfig, DeviceState, Error, HeartbeatConfig, Node, Property,
    PropertyValue, RgbColor, recipes,
};

fn light_node() -> Node {
    let mut light = Node::new("light", "Light", "lamp").unwrap();
    light
        .add_property(recipes::boolean("power").name("Power").build().unwrap())
        .unwrap();
    light
        .add_property(
            recipes::integer("brightness")
                .unit("%")
                .format("0:100")
                .settable(true)
                .build()
                .unwrap(),
        )
        .unwrap();
    light
}

fn lamp(config: DeviceConfig) -> (Device<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new();
    let device = Device::builder("lamp", "Lamp", transport.clone())
        .config(config)
        .node(light_node())
        .build()
        .unwrap();
    (device, transport)
}

async fn started() -> (Device<MemoryTransport>, MemoryTransport) {
    let (mut device, transport) = lamp(DeviceConfig::default());
    device.start().await.unwrap();
    transport.clear_published();
    (device, transport)
}

#[tokio::test]
async fn announce_publishes_every_attribute_in_order() {
    let (mut device, transport) = lamp(DeviceConfig::default());
    device.start().await.unwrap();

    let published: Vec<(String, String)> = transport
        .published()
        .into_iter()
        .map(|p| (p.topic, p.payload))
        .collect();
    let expected = [
        ("homie/lamp/$homie", "4.0.0"),
        ("homie/lamp/$name", "Lamp"),
        ("homie/lamp/$implementation", "homie_device"),
        ("homie/lamp/$nodes", "light"),
        ("homie/lamp/light/$name", "Light"),
        ("homie/lamp/light/$type", "lamp"),
        ("homie/lamp/light/$properties", "power,brightness"),
        ("homie/lamp/light/power/$name", "Power"),
        ("homie/lamp/light/power/$datatype", "boolean"),
        ("homie/lamp/light/power/$settable", "true"),
        ("homie/lamp/light/power/$retained", "true"),
        ("homie/lamp/light/power", "false"),
        ("homie/lamp/light/brightness/$name", "brightness"),
        ("homie/lamp/light/brightness/$datatype", "integer"),
        ("homie/lamp/light/brightness/$settable", "true"),
        ("homie/lamp/light/brightness/$retained", "true"),
        ("homie/lamp/light/brightness/$unit", "%"),
        ("homie/lamp/light/brightness/$format", "0:100"),
        ("homie/lamp/light/brightness", "0"),
        ("homie/lamp/$state", "ready"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|(t, p)| ((*t).to_string(), (*p).to_string()))
        .collect();
    assert_eq!(published, expected);

    assert!(transport.published().iter().all(|p| p.retained));
    assert!(
        transport
            .published()
            .iter()
            .all(|p| p.qos == Qos::AtLeastOnce)
    );
    assert_eq!(device.state(), DeviceState::Ready);
    assert!(device.is_frozen());
}

#[tokio::test]
async fn init_state_is_never_published() {
    let (mut device, transport) = lamp(DeviceConfig::default());
    device.start().await.unwrap();
    assert!(
        transport
            .published()
            .iter()
            .all(|p| !(p.topic == "homie/lamp/$state" && p.payload == "init"))
    );
}

#[tokio::test]
async fn last_will_and_subscriptions() {
    let (mut device, transport) = lamp(DeviceConfig::default());
    device.start().await.unwrap();

    let will = transport.last_will().unwrap();
    assert_eq!(will.topic, "homie/lamp/$state");
    assert_eq!(will.payload, "lost");
    assert!(will.retained);

    assert_eq!(
        transport.subscriptions(),
        ["homie/lamp/+/+/set", "homie/$broadcast/#"]
    );
}

#[tokio::test]
async fn custom_base_topic_without_broadcast() {
    let config = DeviceConfig {
        base_topic: "devices".to_string(),
        subscribe_broadcast: false,
        ..DeviceConfig::default()
    };
    let (mut device, transport) = lamp(config);
    device.start().await.unwrap();

    assert_eq!(transport.subscriptions(), ["devices/lamp/+/+/set"]);
    assert_eq!(
        transport.last_payload("devices/lamp/$state").as_deref(),
        Some("ready")
    );
}

#[tokio::test]
async fn color_command_round_trip() {
    let transport = MemoryTransport::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);

    let mut light = Node::new("light", "Light", "lamp").unwrap();
    light
        .add_property(
            recipes::rgb("color")
                .on_set(move |value| sink.lock().push(value.clone()))
                .build()
                .unwrap(),
        )
        .unwrap();
    let mut device = Device::builder("lamp", "Lamp", transport.clone())
        .node(light)
        .build()
        .unwrap();
    device.start().await.unwrap();
    transport.clear_published();

    transport.push_message("homie/lamp/light/color/set", "255,0,128");
    assert_eq!(device.tick().await.unwrap(), 1);

    let published = transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "homie/lamp/light/color");
    assert_eq!(published[0].payload, "255,0,128");
    assert!(published[0].retained);

    let value = device
        .node("light")
        .unwrap()
        .property("color")
        .unwrap()
        .value()
        .and_then(PropertyValue::as_rgb);
    assert_eq!(value, Some(RgbColor::new(255, 0, 128)));
    assert_eq!(received.lock().len(), 1);
}

#[tokio::test]
async fn integer_range_is_enforced() {
    let (mut device, transport) = started().await;

    transport.push_message("homie/lamp/light/brightness/set", "150");
    transport.push_message("homie/lamp/light/brightness/set", "abc");
    assert_eq!(device.tick().await.unwrap(), 2);
    assert!(transport.published().is_empty());

    transport.push_message("homie/lamp/light/brightness/set", "42");
    device.tick().await.unwrap();
    assert_eq!(
        transport.last_payload("homie/lamp/light/brightness").as_deref(),
        Some("42")
    );
    assert_eq!(device.state(), DeviceState::Ready);
}

#[tokio::test]
async fn handle_message_reports_invalid_values() {
    let (mut device, _transport) = started().await;
    let err = device
        .handle_message("homie/lamp/light/brightness/set", "150")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Value(_)));

    let stored = device
        .node("light")
        .unwrap()
        .property("brightness")
        .unwrap()
        .payload();
    assert_eq!(stored.as_deref(), Some("0"));
}

#[tokio::test]
async fn read_only_property_rejects_commands() {
    let transport = MemoryTransport::new();
    let mut sensor = Node::new("sensor", "Sensor", "climate").unwrap();
    sensor
        .add_property(
            Property::builder("temperature", Datatype::Float)
                .unit("°C")
                .value(21.5)
                .build()
                .unwrap(),
        )
        .unwrap();
    let mut device = Device::builder("probe", "Probe", transport.clone())
        .node(sensor)
        .build()
        .unwrap();
    device.start().await.unwrap();
    transport.clear_published();

    let err = device
        .handle_message("homie/probe/sensor/temperature/set", "30")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotSettable(ref id) if id == "temperature"));

    transport.push_message("homie/probe/sensor/temperature/set", "30");
    device.tick().await.unwrap();
    assert_eq!(transport.publish_attempts(), 0);
    assert_eq!(
        device
            .node("sensor")
            .unwrap()
            .property("temperature")
            .unwrap()
            .payload()
            .as_deref(),
        Some("21.5")
    );
}

#[tokio::test]
async fn local_set_publishes_when_online() {
    let (mut device, transport) = started().await;
    device
        .set_property("light", "brightness", 75)
        .await
        .unwrap();
    assert_eq!(
        transport.last_payload("homie/lamp/light/brightness").as_deref(),
        Some("75")
    );

    let err = device
        .set_property("light", "brightness", 101)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Value(_)));
    assert!(matches!(
        device.set_property("light", "missing", 1).await,
        Err(Error::NotFound { kind: "property", .. })
    ));
    assert!(matches!(
        device.set_property("fan", "power", true).await,
        Err(Error::NotFound { kind: "node", .. })
    ));
}

#[tokio::test]
async fn local_set_before_start_goes_out_with_announce() {
    let (mut device, transport) = lamp(DeviceConfig::default());
    device.set_property("light", "power", true).await.unwrap();
    assert!(transport.published().is_empty());

    device.start().await.unwrap();
    assert_eq!(
        transport.last_payload("homie/lamp/light/power").as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (mut device, transport) = started().await;

    device.stop().await.unwrap();
    assert_eq!(device.state(), DeviceState::Disconnected);
    assert_eq!(
        transport.published_topics(),
        ["homie/lamp/$state".to_string()]
    );
    assert_eq!(
        transport.last_payload("homie/lamp/$state").as_deref(),
        Some("disconnected")
    );
    assert!(!transport.is_connected());

    device.stop().await.unwrap();
    assert_eq!(device.state(), DeviceState::Disconnected);
    assert_eq!(transport.published().len(), 1);
    assert_eq!(transport.disconnect_count(), 1);
}

#[tokio::test]
async fn stop_before_start() {
    let (mut device, transport) = lamp(DeviceConfig::default());
    device.stop().await.unwrap();
    assert_eq!(device.state(), DeviceState::Disconnected);
    assert_eq!(transport.publish_attempts(), 0);
}

#[tokio::test]
async fn restart_after_stop() {
    let (mut device, transport) = started().await;
    device.stop().await.unwrap();
    device.start().await.unwrap();

    assert_eq!(device.state(), DeviceState::Ready);
    assert_eq!(transport.connect_count(), 2);
    assert_eq!(
        transport.last_payload("homie/lamp/$state").as_deref(),
        Some("ready")
    );
}

#[tokio::test]
async fn connection_loss_publishes_nothing() {
    let (mut device, transport) = started().await;

    transport.drop_connection();
    device.tick().await.unwrap();

    assert_eq!(device.state(), DeviceState::Lost);
    assert_eq!(transport.publish_attempts(), 0);

    let err = device
        .handle_message("homie/lamp/light/power/set", "true")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAccepting(DeviceState::Lost)));
}

#[tokio::test]
async fn reconnect_announces_again() {
    let (mut device, transport) = started().await;

    transport.drop_connection();
    device.tick().await.unwrap();
    device.set_property("light", "brightness", 30).await.unwrap();
    assert_eq!(transport.publish_attempts(), 0);

    transport.restore_connection();
    device.tick().await.unwrap();

    assert_eq!(device.state(), DeviceState::Ready);
    let topics = transport.published_topics();
    assert_eq!(topics.first().map(String::as_str), Some("homie/lamp/$homie"));
    assert_eq!(topics.last().map(String::as_str), Some("homie/lamp/$state"));
    assert_eq!(
        transport.last_payload("homie/lamp/light/brightness").as_deref(),
        Some("30")
    );
    assert_eq!(
        transport.subscriptions(),
        ["homie/lamp/+/+/set", "homie/$broadcast/#"]
    );
}

#[tokio::test]
async fn stop_while_lost_skips_state_publish() {
    let (mut device, transport) = started().await;
    transport.drop_connection();
    device.tick().await.unwrap();

    device.stop().await.unwrap();
    assert_eq!(device.state(), DeviceState::Disconnected);
    assert_eq!(transport.publish_attempts(), 0);
}

#[tokio::test]
async fn alert_and_sleeping_still_accept_commands() {
    let (mut device, transport) = started().await;

    device.set_state(DeviceState::Alert).await.unwrap();
    assert_eq!(
        transport.last_payload("homie/lamp/$state").as_deref(),
        Some("alert")
    );
    transport.push_message("homie/lamp/light/power/set", "true");
    device.tick().await.unwrap();
    assert_eq!(
        transport.last_payload("homie/lamp/light/power").as_deref(),
        Some("true")
    );

    device.set_state(DeviceState::Sleeping).await.unwrap();
    transport.push_message("homie/lamp/light/power/set", "FALSE");
    device.tick().await.unwrap();
    assert_eq!(
        transport.last_payload("homie/lamp/light/power").as_deref(),
        Some("false")
    );
}

#[tokio::test]
async fn topology_is_frozen_after_start() {
    let (mut device, _transport) = started().await;

    let err = device
        .add_node(Node::new("fan", "Fan", "fan").unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::TopologyFrozen));

    let err = device
        .node_mut("light")
        .unwrap()
        .add_property(recipes::rgb("color").build().unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::TopologyFrozen));
    assert_eq!(device.nodes().count(), 1);
}

#[tokio::test]
async fn duplicate_node_is_rejected() {
    let (mut device, _transport) = lamp(DeviceConfig::default());
    let err = device
        .add_node(Node::new("light", "Light", "lamp").unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateIdentifier { kind: "node", .. }));
}

#[tokio::test]
async fn broadcast_is_delivered() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let transport = MemoryTransport::new();
    let mut device = Device::builder("lamp", "Lamp", transport.clone())
        .node(light_node())
        .on_broadcast(move |level, payload| {
            sink.lock().push(format!("{level}={payload}"));
        })
        .build()
        .unwrap();
    device.start().await.unwrap();

    transport.push_message("homie/$broadcast/alert", "Intruder detected");
    transport.push_message("homie/$broadcast/security/alarm", "on");
    device.tick().await.unwrap();

    assert_eq!(
        *received.lock(),
        ["alert=Intruder detected", "security/alarm=on"]
    );
}

#[tokio::test]
async fn tick_respects_message_budget() {
    let config = DeviceConfig {
        max_messages_per_tick: 2,
        ..DeviceConfig::default()
    };
    let (mut device, transport) = lamp(config);
    device.start().await.unwrap();

    for value in ["1", "2", "3"] {
        transport.push_message("homie/lamp/light/brightness/set", value);
    }
    assert_eq!(device.tick().await.unwrap(), 2);
    assert_eq!(device.tick().await.unwrap(), 1);
    assert_eq!(device.tick().await.unwrap(), 0);
    assert_eq!(
        transport.last_payload("homie/lamp/light/brightness").as_deref(),
        Some("3")
    );
}

#[tokio::test(start_paused = true)]
async fn heartbeat_republishes_state() {
    let config = DeviceConfig {
        heartbeat: HeartbeatConfig {
            interval: 10,
            ..HeartbeatConfig::default()
        },
        ..DeviceConfig::default()
    };
    let (mut device, transport) = lamp(config);
    device.start().await.unwrap();
    transport.clear_published();

    tokio::time::advance(Duration::from_secs(5)).await;
    device.tick().await.unwrap();
    assert!(transport.published().is_empty());

    tokio::time::advance(Duration::from_secs(6)).await;
    device.tick().await.unwrap();
    assert_eq!(
        transport.published_topics(),
        ["homie/lamp/$state".to_string()]
    );
    assert_eq!(
        transport.last_payload("homie/lamp/$state").as_deref(),
        Some("ready")
    );

    device.tick().await.unwrap();
    assert_eq!(transport.published().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn disabled_heartbeat_stays_quiet() {
    let config = DeviceConfig {
        heartbeat: HeartbeatConfig::DISABLED,
        ..DeviceConfig::default()
    };
    let (mut device, transport) = lamp(config);
    device.start().await.unwrap();
    transport.clear_published();

    tokio::time::advance(Duration::from_secs(3600)).await;
    device.tick().await.unwrap();
    assert!(transport.published().is_empty());
}

#[tokio::test]
async fn wildcard_base_topic_is_rejected() {
    let config = DeviceConfig::from_json(r#"{"base_topic": "bad/#"}"#).unwrap();
    let transport = MemoryTransport::new();
    let err = Device::builder("lamp", "Lamp", transport.clone())
        .config(config)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBaseTopic(ref base) if base == "bad/#"));
    assert_eq!(transport.publish_attempts(), 0);
}
