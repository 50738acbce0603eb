//! BAM transfers between nodes sharing one simulated bus.
mod helpers {
    include!("../../../helpers/mod.rs");
}

use helpers::{cm_frame, dt_frame, payload, BusLink, MockLink, RecordingDelay, SharedBus};
use korri_j1939::core::Message;
use korri_j1939::protocol::managment::iso_name::IsoName;
use korri_j1939::protocol::node::config::NodeConfig;
use korri_j1939::protocol::node::Node;
use korri_j1939::protocol::transport::tp::cm::{AbortReason, ConnectionManagement};
use korri_j1939::protocol::transport::tp::ConnectionKind;
use korri_j1939::protocol::{PGN_TP_CM, PGN_TP_DT};

const PGN: u32 = 0x00FEE0;

fn bus_node(bus: &std::rc::Rc<std::cell::RefCell<SharedBus>>, name: u64, address: u8) -> Node<BusLink> {
    let config = NodeConfig::new(IsoName::from_raw(name), address);
    Node::init(config, SharedBus::attach(bus), &mut RecordingDelay::default()).unwrap()
}

fn run(nodes: &mut [&mut Node<BusLink>], ticks: usize) {
    for _ in 0..ticks {
        for node in nodes.iter_mut() {
            node.update();
        }
    }
}

#[test]
fn broadcast_reaches_every_node() {
    let bus = SharedBus::new();
    let mut sender = bus_node(&bus, 0x100, 0x20);
    let mut first = bus_node(&bus, 0x200, 0x30);
    let mut second = bus_node(&bus, 0x300, 0x40);

    let data = payload(20);
    sender
        .send(&Message::new(PGN, 6, 0x20, 255, &data))
        .unwrap();
    assert_eq!(sender.connection_kind(), ConnectionKind::Broadcast);

    run(&mut [&mut sender, &mut first, &mut second], 30);

    assert_eq!(sender.connection_kind(), ConnectionKind::None);
    for receiver in [&first, &second] {
        let delivered = &receiver.link().delivered;
        assert_eq!(delivered.len(), 1);
        let message = delivered[0].as_message();
        assert_eq!(message.pgn, PGN);
        assert_eq!(message.source, 0x20);
        assert_eq!(message.destination, 255);
        assert_eq!(message.priority, 7);
        assert_eq!(message.data, &data[..]);
        assert_eq!(receiver.connection_kind(), ConnectionKind::None);
    }
}

#[test]
fn wire_shows_announce_then_numbered_packets() {
    let bus = SharedBus::new();
    let mut sender = bus_node(&bus, 0x100, 0x20);
    let mut receiver = bus_node(&bus, 0x200, 0x30);

    let data = payload(20);
    sender.send(&Message::new(PGN, 3, 0x20, 255, &data)).unwrap();
    run(&mut [&mut sender, &mut receiver], 30);

    let log = bus.borrow().log.clone();
    let transfer: Vec<_> = log
        .iter()
        .filter(|f| matches!(f.id.pgn(), PGN_TP_CM | PGN_TP_DT))
        .collect();
    assert_eq!(transfer.len(), 4);

    let announce = transfer[0];
    assert_eq!(announce.id.priority(), 7);
    assert_eq!(announce.id.destination(), 255);
    assert_eq!(announce.data, [32, 20, 0, 3, 0xFF, 0xE0, 0xFE, 0x00]);

    for (index, packet) in transfer[1..].iter().enumerate() {
        assert_eq!(packet.id.pgn(), PGN_TP_DT);
        assert_eq!(packet.id.destination(), 255);
        assert_eq!(packet.data[0], index as u8 + 1);
    }
    assert_eq!(&transfer[3].data[1..], &[data[14], data[15], data[16], data[17], data[18], data[19], 0xFF]);
}

#[test]
fn packets_are_paced_every_fifty_milliseconds() {
    let mut node = Node::init(
        NodeConfig::new(IsoName::from_raw(0x100), 0x20),
        MockLink::new(),
        &mut RecordingDelay::default(),
    )
    .unwrap();
    let data = payload(21);
    node.send(&Message::new(PGN, 6, 0x20, 255, &data)).unwrap();

    let mut sent_at = Vec::new();
    for tick in 1..=20 {
        let before = node.link().sent_with_pgn(PGN_TP_DT).len();
        node.update();
        if node.link().sent_with_pgn(PGN_TP_DT).len() > before {
            sent_at.push(tick * 10);
        }
    }
    assert_eq!(sent_at, vec![50, 100, 150]);
}

#[test]
fn stalled_broadcast_is_aborted_to_everyone() {
    let mut node = Node::init(
        NodeConfig::new(IsoName::from_raw(0x100), 0x20),
        MockLink::new(),
        &mut RecordingDelay::default(),
    )
    .unwrap();
    let announce = ConnectionManagement::BroadcastAnnounce {
        total_size: 20,
        total_packets: 3,
        pgn: PGN,
    };
    node.link_mut().push(cm_frame(&announce, 0x50, 255));
    node.link_mut().push(dt_frame(1, &[1, 2, 3, 4, 5, 6, 7], 0x50, 255));
    node.update();
    assert_eq!(node.connection_kind(), ConnectionKind::Broadcast);

    for _ in 0..123 {
        node.update();
    }
    assert_eq!(node.connection_kind(), ConnectionKind::Broadcast);

    node.update();
    assert_eq!(node.connection_kind(), ConnectionKind::None);
    let abort = *node.link().sent_with_pgn(PGN_TP_CM).last().unwrap();
    assert_eq!(abort.id.destination(), 255);
    assert_eq!(
        ConnectionManagement::decode(abort.payload()),
        Ok(ConnectionManagement::Abort {
            reason: AbortReason::Timeout,
            pgn: PGN,
        })
    );
    assert!(node.link().delivered.is_empty());
}

#[test]
fn oversized_announce_is_ignored() {
    let mut node = Node::init(
        NodeConfig::new(IsoName::from_raw(0x100), 0x20),
        MockLink::new(),
        &mut RecordingDelay::default(),
    )
    .unwrap();
    let announce = ConnectionManagement::BroadcastAnnounce {
        total_size: 1786,
        total_packets: 255,
        pgn: PGN,
    };
    node.link_mut().push(cm_frame(&announce, 0x50, 255));
    node.update();

    assert_eq!(node.connection_kind(), ConnectionKind::None);
    assert!(node.link().sent_with_pgn(PGN_TP_CM).is_empty());
}
