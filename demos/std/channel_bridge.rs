//! # Channel bridge
//!
//! Two nodes driven by the async driver, each on its own set of static
//! `embassy_sync` channels. A bridge task copies outgoing frames of one node
//! into the receive channel of the other, the way a CAN controller would.
//!
//! ```bash
//! cargo run --example channel_bridge
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_util::{future::select, future::Either, pin_mut};
use static_cell::StaticCell;

use korri_j1939::core::Message;
use korri_j1939::protocol::managment::iso_name::IsoName;
use korri_j1939::protocol::node::config::NodeConfig;
use korri_j1939::protocol::node::driver::{drive, EmbassyStartupDelay};
use korri_j1939::protocol::node::Node;
use korri_j1939::protocol::transport::channel_link::LinkChannels;

type Channels = LinkChannels<CriticalSectionRawMutex, 16, 16, 4>;

static LEFT: StaticCell<Channels> = StaticCell::new();
static RIGHT: StaticCell<Channels> = StaticCell::new();
static STOP_LEFT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static STOP_RIGHT: Signal<CriticalSectionRawMutex, ()> = Signal::new();

const PGN_DEMO: u32 = 0x00FF42;

/// Forward every transmitted frame to the other side, forever.
async fn bridge(left: &'static Channels, right: &'static Channels) {
    loop {
        let from_left = left.tx.receive();
        let from_right = right.tx.receive();
        pin_mut!(from_left);
        pin_mut!(from_right);

        match select(from_left, from_right).await {
            Either::Left((frame, _)) => right.rx.send(frame).await,
            Either::Right((frame, _)) => left.rx.send(frame).await,
        }
    }
}

/// Wait for the demo PGN on the right node, then stop both drivers.
async fn application(right: &'static Channels) {
    loop {
        let message = right.app.receive().await;
        if message.pgn == PGN_DEMO {
            println!(
                "right node received {} bytes from {:#04X}",
                message.payload.len(),
                message.source
            );
            break;
        }
    }
    STOP_LEFT.signal(());
    STOP_RIGHT.signal(());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let left: &'static Channels = LEFT.init(LinkChannels::new());
    let right: &'static Channels = RIGHT.init(LinkChannels::new());

    let mut delay = EmbassyStartupDelay;
    let name = |id| IsoName::builder().identity_number(id).function(130).build();

    let (mut left_node, mut right_node) = match (
        Node::init(NodeConfig::new(name(1), 0x10), left.link(), &mut delay),
        Node::init(NodeConfig::new(name(2), 0x11), right.link(), &mut delay),
    ) {
        (Ok(l), Ok(r)) => (l, r),
        _ => return eprintln!("node initialization failed"),
    };

    let payload = [0x5Au8; 64];
    if let Err(e) = left_node.send(&Message::new(PGN_DEMO, 6, 0x10, 0x11, &payload)) {
        return eprintln!("send failed: {e}");
    }

    let glue = async {
        let bridge = bridge(left, right);
        let app = application(right);
        pin_mut!(bridge);
        pin_mut!(app);
        select(bridge, app).await;
    };

    tokio::join!(
        drive(&mut left_node, &STOP_LEFT),
        drive(&mut right_node, &STOP_RIGHT),
        glue
    );
    println!("both drivers stopped");
}
