//! Accessor surface the engines use to reach their node: current source
//! address, gated transmission, and delivery to the application.
//!
//! Address Claim and Transport Protocol only ever receive a `&mut NodePort`,
//! never the whole node record, so they cannot alias each other's state.
use crate::core::Message;
use crate::error::SendError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::link::J1939Link;

/// Link plus the per-node fields shared by every engine.
pub struct NodePort<L: J1939Link> {
    link: L,
    source_address: u8,
    transmit_enabled: bool,
}

impl<L: J1939Link> NodePort<L> {
    pub fn new(link: L, source_address: u8, transmit_enabled: bool) -> Self {
        Self {
            link,
            source_address,
            transmit_enabled,
        }
    }

    #[inline]
    pub fn source_address(&self) -> u8 {
        self.source_address
    }

    #[inline]
    pub fn set_source_address(&mut self, address: u8) {
        self.source_address = address;
    }

    #[inline]
    pub fn transmit_enabled(&self) -> bool {
        self.transmit_enabled
    }

    /// Permanently forbid transmission (Cannot-Claim).
    #[inline]
    pub fn disable_transmit(&mut self) {
        self.transmit_enabled = false;
    }

    /// Send a single-frame message unless transmission is disabled.
    pub fn transmit(&mut self, message: &Message<'_>) -> Result<(), SendError<L::Error>> {
        if !self.transmit_enabled {
            return Err(SendError::TransmitDisabled);
        }
        self.transmit_unchecked(message)
    }

    /// Send a single-frame message regardless of the transmit gate. Only the
    /// Cannot-Claim announcement goes through here.
    pub fn transmit_unchecked(
        &mut self,
        message: &Message<'_>,
    ) -> Result<(), SendError<L::Error>> {
        let frame = CanFrame::from_message(message).ok_or(SendError::PayloadTooLarge {
            len: message.data.len(),
        })?;
        self.link.send(&frame).map_err(SendError::Link)
    }

    #[inline]
    pub fn deliver(&mut self, message: &Message<'_>) {
        self.link.deliver(message);
    }

    #[inline]
    pub fn poll_frame(&mut self) -> Option<CanFrame> {
        self.link.poll_frame()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}
