//! Node registry: validation before any side effect, handles, and ticking
//! several nodes on one bus.
mod helpers {
    include!("../../helpers/mod.rs");
}

use helpers::{payload, BusLink, MockLink, RecordingDelay, SharedBus};
use korri_j1939::core::Message;
use korri_j1939::error::InitError;
use korri_j1939::protocol::managment::iso_name::IsoName;
use korri_j1939::protocol::node::config::NodeConfig;
use korri_j1939::protocol::node::registry::NodeRegistry;

fn config(name: u64, address: u8) -> NodeConfig {
    NodeConfig::new(IsoName::from_raw(name), address)
}

#[test]
fn nodes_get_distinct_handles() {
    let mut registry: NodeRegistry<MockLink, 4> = NodeRegistry::new();
    let mut delay = RecordingDelay::default();

    let first = registry.init(config(1, 0x10), MockLink::new(), &mut delay).unwrap();
    let second = registry.init(config(2, 0x11), MockLink::new(), &mut delay).unwrap();

    assert_ne!(first, second);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.capacity(), 4);
    assert_eq!(registry.source_address(first), Some(0x10));
    assert_eq!(registry.source_address(second), Some(0x11));
    assert_eq!(registry.node(second).unwrap().name(), IsoName::from_raw(2));
    assert_eq!(registry.iter().count(), 2);
}

#[test]
fn full_registry_refuses_without_side_effects() {
    let mut registry: NodeRegistry<MockLink, 1> = NodeRegistry::new();
    let mut delay = RecordingDelay::default();
    registry.init(config(1, 0x10), MockLink::new(), &mut delay).unwrap();

    let result = registry.init(config(2, 0x90), MockLink::new(), &mut delay);

    assert_eq!(result.err(), Some(InitError::RegistryFull));
    assert_eq!(registry.len(), 1);
    assert!(delay.calls.is_empty());
}

#[test]
fn invalid_configuration_is_rejected_before_claiming() {
    let mut registry: NodeRegistry<MockLink, 2> = NodeRegistry::new();
    let mut delay = RecordingDelay::default();

    assert_eq!(
        registry.init(config(1, 254), MockLink::new(), &mut delay).err(),
        Some(InitError::InvalidAddress { address: 254 })
    );
    assert_eq!(
        registry
            .init(config(1, 0x90).with_tick_ms(0), MockLink::new(), &mut delay)
            .err(),
        Some(InitError::InvalidTickPeriod)
    );
    assert!(registry.is_empty());
    assert!(delay.calls.is_empty());
}

#[test]
fn update_all_moves_a_broadcast_between_nodes() {
    let bus = SharedBus::new();
    let mut registry: NodeRegistry<BusLink, 2> = NodeRegistry::new();
    let mut delay = RecordingDelay::default();
    let sender = registry
        .init(config(1, 0x10), SharedBus::attach(&bus), &mut delay)
        .unwrap();
    let receiver = registry
        .init(config(2, 0x11), SharedBus::attach(&bus), &mut delay)
        .unwrap();

    let data = payload(50);
    registry
        .send(sender, &Message::new(0x00FF20, 6, 0x10, 255, &data))
        .unwrap();
    for _ in 0..60 {
        registry.update_all();
    }

    let delivered = &registry.node(receiver).unwrap().link().delivered;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].payload.as_slice(), &data[..]);
    assert!(registry.update(receiver));
}

#[test]
fn listen_only_nodes_hold_no_address() {
    let mut registry: NodeRegistry<MockLink, 1> = NodeRegistry::new();
    let handle = registry
        .init(config(1, 0x10).listen_only(), MockLink::new(), &mut RecordingDelay::default())
        .unwrap();

    assert_eq!(registry.source_address(handle), Some(254));
    assert!(registry.node(handle).unwrap().link().sent.is_empty());
}
