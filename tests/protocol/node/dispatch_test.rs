//! Routing of received frames and the single send entry point.
mod helpers {
    include!("../../helpers/mod.rs");
}

use helpers::{claim_frame, frame, payload, MockLink, MockLinkError, RecordingDelay};
use korri_j1939::core::Message;
use korri_j1939::error::SendError;
use korri_j1939::protocol::managment::iso_name::IsoName;
use korri_j1939::protocol::node::config::NodeConfig;
use korri_j1939::protocol::node::Node;
use korri_j1939::protocol::transport::can_frame::CanFrame;
use korri_j1939::protocol::transport::can_id::CanId;
use korri_j1939::protocol::transport::tp::ConnectionKind;
use korri_j1939::protocol::{PGN_REQUEST, PGN_TP_CM};

const US: u8 = 0x20;

fn node() -> Node<MockLink> {
    let config = NodeConfig::new(IsoName::from_raw(0xABCD), US);
    Node::init(config, MockLink::new(), &mut RecordingDelay::default()).unwrap()
}

#[test]
fn broadcast_and_addressed_messages_reach_the_application() {
    let mut node = node();
    node.link_mut().push(frame(0x00F004, 3, 0x00, 255, &[1, 2, 3, 4, 5, 6, 7, 8]));
    node.link_mut().push(frame(0x00EF00, 6, 0x40, US, &[9, 9]));
    node.update();

    let delivered = &node.link().delivered;
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].pgn, 0x00F004);
    assert_eq!(delivered[0].priority, 3);
    assert_eq!(delivered[0].destination, 255);
    assert_eq!(delivered[0].payload.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(delivered[1].source, 0x40);
    assert_eq!(delivered[1].destination, US);
}

#[test]
fn messages_for_other_nodes_are_dropped() {
    let mut node = node();
    node.link_mut().push(frame(0x00EF00, 6, 0x40, 0x21, &[1]));
    node.update();

    assert!(node.link().delivered.is_empty());
}

#[test]
fn standard_frames_are_dropped() {
    let mut node = node();
    node.link_mut()
        .push(CanFrame::new(CanId(0x123), &[1, 2, 3]).unwrap());
    node.update();

    assert!(node.link().delivered.is_empty());
}

#[test]
fn requests_for_other_pgns_go_to_the_application() {
    let mut node = node();
    let requested = 0x00FEECu32.to_le_bytes();
    node.link_mut().push(frame(PGN_REQUEST, 6, 0x40, US, &requested[..3]));
    node.update();

    assert_eq!(node.link().delivered.len(), 1);
    assert_eq!(node.link().delivered[0].pgn, PGN_REQUEST);
    assert_eq!(node.link().sent.len(), 1);
}

#[test]
fn network_management_traffic_stays_inside_the_stack() {
    let mut node = node();
    node.link_mut().push(claim_frame(0x1, 0x50));
    node.link_mut().push(frame(PGN_TP_CM, 7, 0x50, US, &[0xFF, 0, 0, 0, 0, 0, 0xEF, 0]));
    node.update();

    assert!(node.link().delivered.is_empty());
}

#[test]
fn short_messages_leave_as_one_frame_from_the_current_address() {
    let mut node = node();
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
    node.send(&Message::new(0x00FF10, 4, 0x99, 255, &data)).unwrap();

    let sent = node.link().sent.last().unwrap();
    assert_eq!(sent.id.pgn(), 0x00FF10);
    assert_eq!(sent.id.priority(), 4);
    assert_eq!(sent.id.source_address(), US);
    assert_eq!(sent.payload(), &data);
    assert_eq!(node.connection_kind(), ConnectionKind::None);
}

#[test]
fn long_messages_open_a_transport_connection() {
    let mut node = node();
    let data = payload(9);
    node.send(&Message::new(0x00FF10, 6, US, 255, &data)).unwrap();
    assert_eq!(node.connection_kind(), ConnectionKind::Broadcast);

    let other = payload(30);
    assert_eq!(
        node.send(&Message::new(0x00EF00, 6, US, 0x30, &other)),
        Err(SendError::ConnectionBusy)
    );
}

#[test]
fn payload_beyond_transport_capacity_is_refused() {
    let mut node = node();
    let data = payload(1786);
    assert_eq!(
        node.send(&Message::new(0x00FF10, 6, US, 255, &data)),
        Err(SendError::PayloadTooLarge { len: 1786 })
    );
    assert_eq!(node.connection_kind(), ConnectionKind::None);
}

#[test]
fn link_failures_are_reported() {
    let mut node = node();
    node.link_mut().fail_send = true;

    assert_eq!(
        node.send(&Message::new(0x00FF10, 6, US, 255, &[1])),
        Err(SendError::Link(MockLinkError))
    );

    let data = payload(40);
    assert_eq!(
        node.send(&Message::new(0x00FF10, 6, US, 255, &data)),
        Err(SendError::Link(MockLinkError))
    );
    assert_eq!(node.connection_kind(), ConnectionKind::None);
}

#[test]
fn failed_startup_claim_keeps_the_address() {
    let mut link = MockLink::new();
    link.fail_send = true;
    let config = NodeConfig::new(IsoName::from_raw(0xABCD), US);
    let node = Node::init(config, link, &mut RecordingDelay::default()).unwrap();

    assert_eq!(node.source_address(), US);
    assert!(node.link().sent.is_empty());
}
