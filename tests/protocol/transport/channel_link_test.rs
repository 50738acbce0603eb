//! Node running on top of `embassy_sync` channels.
mod helpers {
    include!("../../helpers/mod.rs");
}

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use helpers::{frame, RecordingDelay};
use korri_j1939::core::Message;
use korri_j1939::error::{ChannelLinkError, SendError};
use korri_j1939::protocol::managment::iso_name::IsoName;
use korri_j1939::protocol::node::config::NodeConfig;
use korri_j1939::protocol::node::Node;
use korri_j1939::protocol::transport::channel_link::LinkChannels;
use korri_j1939::protocol::transport::traits::link::J1939Link;
use korri_j1939::protocol::PGN_ADDRESS_CLAIMED;

const NAME: IsoName = IsoName::from_raw(0x42);

#[test]
fn frames_flow_through_the_channels() {
    let channels: LinkChannels<NoopRawMutex, 4, 4, 4> = LinkChannels::new();
    let mut node = Node::init(
        NodeConfig::new(NAME, 0x20),
        channels.link(),
        &mut RecordingDelay::default(),
    )
    .unwrap();

    let claim = channels.tx.try_receive().unwrap();
    assert_eq!(claim.id.pgn(), PGN_ADDRESS_CLAIMED);
    assert_eq!(claim.id.source_address(), 0x20);

    channels
        .rx
        .try_send(frame(0x00FEF1, 6, 0x00, 255, &[1, 2, 3, 4, 5, 6, 7, 8]))
        .unwrap();
    node.update();

    let delivered = channels.app.try_receive().unwrap();
    assert_eq!(delivered.pgn, 0x00FEF1);
    assert_eq!(delivered.payload.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(channels.app.try_receive().is_err());
}

#[test]
fn full_transmit_queue_is_reported() {
    let channels: LinkChannels<NoopRawMutex, 2, 1, 2> = LinkChannels::new();
    let mut node = Node::init(
        NodeConfig::new(NAME, 0x20),
        channels.link(),
        &mut RecordingDelay::default(),
    )
    .unwrap();

    assert_eq!(
        node.send(&Message::new(0x00FF00, 6, 0x20, 255, &[1])),
        Err(SendError::Link(ChannelLinkError::TxQueueFull))
    );

    channels.tx.try_receive().unwrap();
    assert_eq!(node.send(&Message::new(0x00FF00, 6, 0x20, 255, &[1])), Ok(()));
}

#[test]
fn deliveries_beyond_capacity_are_counted() {
    let channels: LinkChannels<NoopRawMutex, 4, 4, 1> = LinkChannels::new();
    let mut link = channels.link();
    let data = [7u8; 3];

    link.deliver(&Message::new(0x00FF00, 6, 0x10, 255, &data));
    link.deliver(&Message::new(0x00FF01, 6, 0x10, 255, &data));

    assert_eq!(link.dropped_deliveries(), 1);
    assert_eq!(channels.app.try_receive().unwrap().pgn, 0x00FF00);
    assert!(link.poll_frame().is_none());
}
