//! [`J1939Link`] backed by pre-allocated `embassy_sync` channels.
//!
//! Firmware owns three channels: frames received by the CAN controller, frames
//! the stack wants to transmit, and messages for the application. The node
//! only uses the non-blocking `try_*` side; interrupt handlers and async tasks
//! fill and drain the other side.
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use korri_j1939::protocol::transport::channel_link::LinkChannels;
//!
//! let channels: LinkChannels<NoopRawMutex, 8, 8, 2> = LinkChannels::new();
//! let link = channels.link();
//! # let _ = link;
//! ```
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::core::{Message, OwnedMessage};
use crate::error::ChannelLinkError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::link::J1939Link;

/// Channel storage, typically placed in a `static`.
pub struct LinkChannels<M: RawMutex, const RX: usize, const TX: usize, const APP: usize> {
    /// Frames read from the bus, pushed by the RX side.
    pub rx: Channel<M, CanFrame, RX>,
    /// Frames to put on the bus, drained by the TX side.
    pub tx: Channel<M, CanFrame, TX>,
    /// Messages delivered to the application.
    pub app: Channel<M, OwnedMessage, APP>,
}

impl<M: RawMutex, const RX: usize, const TX: usize, const APP: usize> Default
    for LinkChannels<M, RX, TX, APP>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const RX: usize, const TX: usize, const APP: usize> LinkChannels<M, RX, TX, APP> {
    pub const fn new() -> Self {
        Self {
            rx: Channel::new(),
            tx: Channel::new(),
            app: Channel::new(),
        }
    }

    /// Node-side view over the three channels.
    pub fn link(&self) -> ChannelLink<'_, M, RX, TX, APP> {
        ChannelLink::new(&self.rx, &self.tx, &self.app)
    }
}

/// Borrowing link over three channels.
pub struct ChannelLink<'a, M: RawMutex, const RX: usize, const TX: usize, const APP: usize> {
    rx: &'a Channel<M, CanFrame, RX>,
    tx: &'a Channel<M, CanFrame, TX>,
    app: &'a Channel<M, OwnedMessage, APP>,
    dropped: usize,
}

impl<'a, M: RawMutex, const RX: usize, const TX: usize, const APP: usize>
    ChannelLink<'a, M, RX, TX, APP>
{
    pub fn new(
        rx: &'a Channel<M, CanFrame, RX>,
        tx: &'a Channel<M, CanFrame, TX>,
        app: &'a Channel<M, OwnedMessage, APP>,
    ) -> Self {
        Self {
            rx,
            tx,
            app,
            dropped: 0,
        }
    }

    /// Deliveries discarded because the application channel was full.
    pub fn dropped_deliveries(&self) -> usize {
        self.dropped
    }
}

impl<M: RawMutex, const RX: usize, const TX: usize, const APP: usize> J1939Link
    for ChannelLink<'_, M, RX, TX, APP>
{
    type Error = ChannelLinkError;

    fn poll_frame(&mut self) -> Option<CanFrame> {
        self.rx.try_receive().ok()
    }

    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        self.tx
            .try_send(frame.clone())
            .map_err(|_| ChannelLinkError::TxQueueFull)
    }

    fn deliver(&mut self, message: &Message<'_>) {
        if self.app.try_send(OwnedMessage::from(message)).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("[link] application queue full, PGN {=u32:#x} dropped", message.pgn);
        }
    }
}
