/// Test doubles simulating the CAN bus, the application, and the startup delay.
use korri_j1939::core::{Message, OwnedMessage};
use korri_j1939::protocol::transport::can_frame::CanFrame;
use korri_j1939::protocol::transport::tp::cm::ConnectionManagement;
use korri_j1939::protocol::transport::traits::{link::J1939Link, startup_delay::StartupDelay};
use korri_j1939::protocol::{PGN_ADDRESS_CLAIMED, PGN_REQUEST, PGN_TP_CM, PGN_TP_DT};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub struct MockLinkError;

#[derive(Default)]
#[allow(dead_code)]
/// Link recording everything the node emits; frames are pushed by hand.
pub struct MockLink {
    pub incoming: VecDeque<CanFrame>,
    pub sent: Vec<CanFrame>,
    pub delivered: Vec<OwnedMessage>,
    pub fail_send: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: CanFrame) {
        self.incoming.push_back(frame);
    }

    /// Sent frames carrying `pgn`.
    pub fn sent_with_pgn(&self, pgn: u32) -> Vec<&CanFrame> {
        self.sent.iter().filter(|f| f.id.pgn() == pgn).collect()
    }

    /// Decoded connection-management frames sent so far.
    pub fn sent_cm(&self) -> Vec<ConnectionManagement> {
        self.sent_with_pgn(PGN_TP_CM)
            .into_iter()
            .filter_map(|f| ConnectionManagement::decode(f.payload()).ok())
            .collect()
    }
}

impl J1939Link for MockLink {
    type Error = MockLinkError;

    fn poll_frame(&mut self) -> Option<CanFrame> {
        self.incoming.pop_front()
    }

    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        if self.fail_send {
            return Err(MockLinkError);
        }
        self.sent.push(frame.clone());
        Ok(())
    }

    fn deliver(&mut self, message: &Message<'_>) {
        self.delivered.push(OwnedMessage::from(message));
    }
}

#[derive(Default)]
#[allow(dead_code)]
/// Single-threaded bus: a frame sent by one attached link reaches every other one.
pub struct SharedBus {
    inboxes: Vec<VecDeque<CanFrame>>,
    /// Every frame seen on the wire, in order.
    pub log: Vec<CanFrame>,
}

#[allow(dead_code)]
impl SharedBus {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn attach(bus: &Rc<RefCell<Self>>) -> BusLink {
        let mut inner = bus.borrow_mut();
        inner.inboxes.push(VecDeque::new());
        BusLink {
            bus: Rc::clone(bus),
            index: inner.inboxes.len() - 1,
            delivered: Vec::new(),
        }
    }

    /// Put a frame on the wire from outside every attached node.
    pub fn inject(&mut self, frame: CanFrame) {
        for inbox in self.inboxes.iter_mut() {
            inbox.push_back(frame.clone());
        }
        self.log.push(frame);
    }
}

#[allow(dead_code)]
pub struct BusLink {
    bus: Rc<RefCell<SharedBus>>,
    index: usize,
    pub delivered: Vec<OwnedMessage>,
}

impl J1939Link for BusLink {
    type Error = MockLinkError;

    fn poll_frame(&mut self) -> Option<CanFrame> {
        self.bus.borrow_mut().inboxes[self.index].pop_front()
    }

    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        let own = self.index;
        for (index, inbox) in bus.inboxes.iter_mut().enumerate() {
            if index != own {
                inbox.push_back(frame.clone());
            }
        }
        bus.log.push(frame.clone());
        Ok(())
    }

    fn deliver(&mut self, message: &Message<'_>) {
        self.delivered.push(OwnedMessage::from(message));
    }
}

#[derive(Default)]
#[allow(dead_code)]
/// Startup delay that only records what it was asked for.
pub struct RecordingDelay {
    pub calls: Vec<u32>,
}

impl StartupDelay for RecordingDelay {
    fn delay_ms(&mut self, millis: u32) {
        self.calls.push(millis);
    }
}

#[allow(dead_code)]
pub fn frame(pgn: u32, priority: u8, source: u8, destination: u8, data: &[u8]) -> CanFrame {
    CanFrame::from_message(&Message::new(pgn, priority, source, destination, data))
        .expect("test frames carry at most eight bytes")
}

#[allow(dead_code)]
/// Address Claimed frame announcing `name` at `address`.
pub fn claim_frame(name: u64, address: u8) -> CanFrame {
    frame(PGN_ADDRESS_CLAIMED, 6, address, 255, &name.to_le_bytes())
}

#[allow(dead_code)]
/// Request for the Address Claimed PGN.
pub fn request_claim_frame(source: u8, destination: u8) -> CanFrame {
    let pgn = PGN_ADDRESS_CLAIMED.to_le_bytes();
    frame(PGN_REQUEST, 6, source, destination, &pgn[..3])
}

#[allow(dead_code)]
pub fn cm_frame(cm: &ConnectionManagement, source: u8, destination: u8) -> CanFrame {
    frame(PGN_TP_CM, 7, source, destination, &cm.encode())
}

#[allow(dead_code)]
/// TP.DT frame with `chunk` padded to seven bytes with 0xFF.
pub fn dt_frame(sequence: u8, chunk: &[u8], source: u8, destination: u8) -> CanFrame {
    let mut data = [0xFF; 8];
    data[0] = sequence;
    data[1..1 + chunk.len()].copy_from_slice(chunk);
    frame(PGN_TP_DT, 7, source, destination, &data)
}

#[allow(dead_code)]
/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}
