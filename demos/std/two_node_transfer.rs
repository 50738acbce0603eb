//! # Two-node transfer
//!
//! Two J1939 nodes on an in-process bus:
//! - Both claim an address, one of them loses arbitration and moves
//! - A 100-byte message goes through RTS/CTS
//! - A 30-byte message goes out as BAM
//!
//! ```bash
//! cargo run --example two_node_transfer
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use korri_j1939::core::{Message, OwnedMessage};
use korri_j1939::protocol::managment::iso_name::IsoName;
use korri_j1939::protocol::node::config::NodeConfig;
use korri_j1939::protocol::node::Node;
use korri_j1939::protocol::transport::can_frame::CanFrame;
use korri_j1939::protocol::transport::tp::ConnectionKind;
use korri_j1939::protocol::transport::traits::{link::J1939Link, startup_delay::StartupDelay};

// ============================================================================
// In-process bus
// ============================================================================

type Wire = Rc<RefCell<[VecDeque<CanFrame>; 2]>>;

struct WireLink {
    wire: Wire,
    side: usize,
    inbox: Vec<OwnedMessage>,
}

impl J1939Link for WireLink {
    type Error = core::convert::Infallible;

    fn poll_frame(&mut self) -> Option<CanFrame> {
        self.wire.borrow_mut()[self.side].pop_front()
    }

    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        println!(
            "   [{}] id=0x{:08X} data={:02X?}",
            self.side,
            frame.id.0,
            frame.payload()
        );
        self.wire.borrow_mut()[1 - self.side].push_back(frame.clone());
        Ok(())
    }

    fn deliver(&mut self, message: &Message<'_>) {
        self.inbox.push(OwnedMessage::from(message));
    }
}

struct NoDelay;

impl StartupDelay for NoDelay {
    fn delay_ms(&mut self, millis: u32) {
        println!("   (startup settle: {} ms skipped)", millis);
    }
}

fn run_until_idle(a: &mut Node<WireLink>, b: &mut Node<WireLink>) {
    for _ in 0..300 {
        a.update();
        b.update();
        if a.connection_kind() == ConnectionKind::None && b.connection_kind() == ConnectionKind::None
        {
            break;
        }
    }
}

fn main() {
    println!("=== korri-j1939 two-node transfer ===\n");

    let wire: Wire = Rc::new(RefCell::new([VecDeque::new(), VecDeque::new()]));
    let link = |side| WireLink {
        wire: Rc::clone(&wire),
        side,
        inbox: Vec::new(),
    };

    // ======================================================================
    // 1. Address claim
    // ======================================================================
    println!("1. Both nodes claim 0x80");

    let engine = IsoName::builder()
        .identity_number(1001)
        .manufacturer_code(113)
        .function(0)
        .industry_group(0)
        .arbitrary_address_capable(true)
        .build();
    let display = IsoName::builder()
        .identity_number(2002)
        .manufacturer_code(113)
        .function(60)
        .industry_group(0)
        .arbitrary_address_capable(true)
        .build();

    let mut a = match Node::init(NodeConfig::new(engine, 0x80), link(0), &mut NoDelay) {
        Ok(node) => node,
        Err(e) => return eprintln!("init failed: {e}"),
    };
    let mut b = match Node::init(NodeConfig::new(display, 0x80), link(1), &mut NoDelay) {
        Ok(node) => node,
        Err(e) => return eprintln!("init failed: {e}"),
    };
    for _ in 0..3 {
        a.update();
        b.update();
    }
    println!(
        "   engine NAME {} at {:#04X}, display NAME {} at {:#04X}\n",
        a.name(),
        a.source_address(),
        b.name(),
        b.source_address()
    );

    // ======================================================================
    // 2. Peer-to-peer transfer
    // ======================================================================
    println!("2. 100 bytes from engine to display (RTS/CTS)");

    let payload: Vec<u8> = (0..100u8).collect();
    let to_display = Message::new(0x00EF00, 6, a.source_address(), b.source_address(), &payload);
    if let Err(e) = a.send(&to_display) {
        return eprintln!("send failed: {e}");
    }
    run_until_idle(&mut a, &mut b);
    for message in &b.link().inbox {
        println!(
            "   display got PGN {:#07X} from {:#04X}: {} bytes\n",
            message.pgn,
            message.source,
            message.payload.len()
        );
    }

    // ======================================================================
    // 3. Broadcast
    // ======================================================================
    println!("3. 30 bytes broadcast by display (BAM)");

    let text = *b"korri-j1939 broadcast demo....";
    if let Err(e) = b.send(&Message::new(0x00FEEB, 6, b.source_address(), 255, &text)) {
        return eprintln!("send failed: {e}");
    }
    run_until_idle(&mut a, &mut b);
    for message in &a.link().inbox {
        println!(
            "   engine got PGN {:#07X}: {:?}",
            message.pgn,
            String::from_utf8_lossy(message.payload.as_slice())
        );
    }

    println!("\nDone.");
}
