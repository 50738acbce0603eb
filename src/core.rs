//! Message-level data types shared by the dispatcher, the engines, and the
//! application boundary.
//!
//! A [`Message`] is transient: it borrows the payload of the frame or of the
//! reassembly buffer it was decoded from. [`OwnedMessage`] copies it into a
//! fixed buffer when it has to outlive that borrow (channels, test recorders).
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::ADDRESS_GLOBAL;

/// Largest payload the transport protocol can carry (255 packets × 7 bytes).
pub const MAX_TP_PAYLOAD: usize = 1785;

/// Largest payload a single CAN frame can carry.
pub const MAX_FRAME_PAYLOAD: usize = 8;

//==================================================================================MESSAGE
/// Decoded application-level unit: routing fields plus a borrowed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    /// Parameter Group Number (18 meaningful bits).
    pub pgn: u32,
    /// Priority (3 bits, 0 = highest).
    pub priority: u8,
    /// Source address of the emitter.
    pub source: u8,
    /// Destination address, `255` for broadcast.
    pub destination: u8,
    /// Payload bytes (up to 8 on a single frame, up to 1785 with transport protocol).
    pub data: &'a [u8],
}

impl<'a> Message<'a> {
    /// Build a message from its routing fields.
    pub const fn new(pgn: u32, priority: u8, source: u8, destination: u8, data: &'a [u8]) -> Self {
        Self {
            pgn,
            priority,
            source,
            destination,
            data,
        }
    }

    /// Decode a raw frame. Returns `None` for legacy standard frames (extended
    /// marker unset) and for frames reporting more than eight data bytes.
    pub fn from_frame(frame: &'a CanFrame) -> Option<Self> {
        if !frame.id.is_extended() || frame.len > MAX_FRAME_PAYLOAD {
            return None;
        }
        Some(Self {
            pgn: frame.id.pgn(),
            priority: frame.id.priority(),
            source: frame.id.source_address(),
            destination: frame.id.destination(),
            data: frame.payload(),
        })
    }

    /// `true` when addressed to every node.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.destination == ADDRESS_GLOBAL
    }
}

//==================================================================================PAYLOAD_BYTES
/// Fixed-capacity payload storage sized for a full transport-protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBytes {
    pub len: usize,
    pub data: [u8; MAX_TP_PAYLOAD],
}

impl Default for PayloadBytes {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBytes {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; MAX_TP_PAYLOAD],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy bytes into the buffer, clamping to the capacity, and update `len`.
    #[inline]
    pub fn copy_from_slice(&mut self, slice: &[u8]) {
        let clamped = slice.len().min(MAX_TP_PAYLOAD);
        self.data[..clamped].copy_from_slice(&slice[..clamped]);
        self.len = clamped;
    }

    /// Immutable view over the populated bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

//==================================================================================OWNED_MESSAGE
/// Owned copy of a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedMessage {
    pub pgn: u32,
    pub priority: u8,
    pub source: u8,
    pub destination: u8,
    pub payload: PayloadBytes,
}

impl OwnedMessage {
    /// Borrow the stored copy back as a [`Message`].
    pub fn as_message(&self) -> Message<'_> {
        Message {
            pgn: self.pgn,
            priority: self.priority,
            source: self.source,
            destination: self.destination,
            data: self.payload.as_slice(),
        }
    }
}

impl From<&Message<'_>> for OwnedMessage {
    fn from(message: &Message<'_>) -> Self {
        let mut payload = PayloadBytes::new();
        payload.copy_from_slice(message.data);
        Self {
            pgn: message.pgn,
            priority: message.priority,
            source: message.source,
            destination: message.destination,
            payload,
        }
    }
}
