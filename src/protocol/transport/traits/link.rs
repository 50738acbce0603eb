//! Capability set tying a node to its CAN controller and to the application.
//! The core is generic over this trait, so a simulated bus can stand in for
//! real hardware in tests.
use crate::core::Message;
use crate::protocol::transport::can_frame::CanFrame;

/// Frame I/O plus application delivery for one node.
///
/// Every method is synchronous and non-blocking: the node calls them from its
/// tick-driven `update` loop.
pub trait J1939Link {
    type Error: core::fmt::Debug;

    /// Next received frame, or `None` when the receive queue is empty.
    fn poll_frame(&mut self) -> Option<CanFrame>;

    /// Place one frame (at most eight payload bytes) on the bus.
    /// A failure is reported to the caller and never retried by the stack.
    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;

    /// Hand a decoded or fully reassembled message to the application.
    fn deliver(&mut self, message: &Message<'_>);
}

impl<T: J1939Link + ?Sized> J1939Link for &mut T {
    type Error = T::Error;

    #[inline]
    fn poll_frame(&mut self) -> Option<CanFrame> {
        (**self).poll_frame()
    }

    #[inline]
    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        (**self).send(frame)
    }

    #[inline]
    fn deliver(&mut self, message: &Message<'_>) {
        (**self).deliver(message)
    }
}
