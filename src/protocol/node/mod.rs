//! Node layer: one record per simulated or real ECU, the dispatcher that
//! routes decoded messages to the engines, and the registry owning the nodes.
//!
//! Received traffic flows as follows:
//!
//! ```text
//! link.poll_frame ─► Message::from_frame ─► destination filter ─┬─► Request(Address Claimed) ─► AddressClaim::on_request
//!                                                               ├─► TP.CM / TP.DT            ─► TransportProtocol::dispatch
//!                                                               ├─► Address Claimed          ─► AddressClaim::on_address_claimed
//!                                                               └─► anything else            ─► link.deliver
//! ```
pub mod config;
pub mod driver;
pub mod port;
pub mod registry;

use crate::core::{Message, MAX_FRAME_PAYLOAD};
use crate::error::{InitError, SendError};
use crate::infra::codec::bits::BitReader;
use crate::protocol::managment::address_claiming::{
    requires_startup_delay, AddressClaim, ClaimState, STARTUP_SETTLE_MS,
};
use crate::protocol::managment::iso_name::IsoName;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::tp::{ConnectionKind, TransportProtocol};
use crate::protocol::transport::traits::link::J1939Link;
use crate::protocol::transport::traits::startup_delay::StartupDelay;
use crate::protocol::{ADDRESS_NULL, PGN_ADDRESS_CLAIMED, PGN_REQUEST, PGN_TP_CM, PGN_TP_DT};
use config::{NodeConfig, NodeMode};
use port::NodePort;

#[cfg(feature = "defmt")]
use defmt::{debug, info};

/// A J1939 node: its link, its claimed address, and its transport connection.
pub struct Node<L: J1939Link> {
    port: NodePort<L>,
    claim: AddressClaim,
    transport: TransportProtocol,
    config: NodeConfig,
}

impl<L: J1939Link> Node<L> {
    /// Validate `config`, then bring the node up on `link`.
    ///
    /// An active node claims its preferred address and, when that address lies
    /// in the self-configurable range, blocks on `delay` for 250 ms. A
    /// listen-only node starts with transmission disabled and never claims.
    pub fn init(
        config: NodeConfig,
        link: L,
        delay: &mut impl StartupDelay,
    ) -> Result<Self, InitError> {
        config.validate()?;

        let active = config.mode == NodeMode::Active;
        let address = if active {
            config.preferred_address
        } else {
            ADDRESS_NULL
        };
        let mut node = Self {
            port: NodePort::new(link, address, active),
            claim: AddressClaim::new(config.name),
            transport: TransportProtocol::new(config.sequence_mismatch),
            config,
        };

        if active {
            // The address is held even if the claim frame could not be sent.
            if let Err(_err) = node.claim.init(&mut node.port, config.preferred_address) {
                #[cfg(feature = "defmt")]
                defmt::warn!("[node] claim not sent: {}", defmt::Debug2Format(&_err));
            }
            if requires_startup_delay(config.preferred_address) {
                delay.delay_ms(STARTUP_SETTLE_MS);
            }
        }

        #[cfg(feature = "defmt")]
        info!(
            "[node] up: address={} listen_only={}",
            node.port.source_address(),
            config.mode == NodeMode::ListenOnly
        );

        Ok(node)
    }

    /// Drain every pending frame, then advance the transport timers by one tick.
    pub fn update(&mut self) {
        while let Some(frame) = self.port.poll_frame() {
            self.handle_frame(&frame);
        }
        self.transport.update(&mut self.port, self.config.tick_ms);
    }

    /// Decode and route one received frame. Standard (11-bit) frames are dropped.
    pub fn handle_frame(&mut self, frame: &CanFrame) {
        let Some(message) = Message::from_frame(frame) else {
            return;
        };

        if self.config.mode == NodeMode::ListenOnly {
            self.port.deliver(&message);
            return;
        }

        if !message.is_broadcast() && message.destination != self.port.source_address() {
            return;
        }

        self.dispatch(&message);
    }

    fn dispatch(&mut self, message: &Message<'_>) {
        match message.pgn {
            PGN_REQUEST if requested_pgn(message.data) == Some(PGN_ADDRESS_CLAIMED) => {
                self.claim.on_request(&mut self.port);
            }
            PGN_TP_CM | PGN_TP_DT => self.transport.dispatch(&mut self.port, message),
            PGN_ADDRESS_CLAIMED => {
                let outcome = self.claim.on_address_claimed(&mut self.port, message);
                if outcome.relinquished_address() {
                    #[cfg(feature = "defmt")]
                    debug!("[node] address lost, closing transport connection");
                    self.transport.close();
                }
            }
            _ => self.port.deliver(message),
        }
    }

    /// Send a message of any size from this node.
    ///
    /// The source field is replaced by the node's current address. Payloads of
    /// at most eight bytes leave as one frame; larger ones open a transport
    /// connection (BAM when `destination` is global, RTS/CTS otherwise).
    pub fn send(&mut self, message: &Message<'_>) -> Result<(), SendError<L::Error>> {
        if !self.port.transmit_enabled() {
            return Err(SendError::TransmitDisabled);
        }
        let message = Message {
            source: self.port.source_address(),
            ..*message
        };
        if message.data.len() <= MAX_FRAME_PAYLOAD {
            self.port.transmit(&message)
        } else {
            self.transport.queue(&mut self.port, &message)
        }
    }

    #[inline]
    pub fn source_address(&self) -> u8 {
        self.port.source_address()
    }

    #[inline]
    pub fn name(&self) -> IsoName {
        self.claim.name()
    }

    /// `None` for a listen-only node.
    pub fn claim_state(&self) -> Option<ClaimState> {
        match self.config.mode {
            NodeMode::Active => Some(self.claim.state()),
            NodeMode::ListenOnly => None,
        }
    }

    #[inline]
    pub fn transmit_enabled(&self) -> bool {
        self.port.transmit_enabled()
    }

    #[inline]
    pub fn connection_kind(&self) -> ConnectionKind {
        self.transport.connection_kind()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn claim(&self) -> &AddressClaim {
        &self.claim
    }

    pub fn transport(&self) -> &TransportProtocol {
        &self.transport
    }

    pub fn link(&self) -> &L {
        self.port.link()
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.port.link_mut()
    }
}

/// PGN named by a Request payload (three bytes, little endian).
fn requested_pgn(data: &[u8]) -> Option<u32> {
    BitReader::new(data).read_u32(24).ok()
}
