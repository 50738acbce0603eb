//! Segmentation and reassembly buffer for one transport-protocol connection.
//!
//! A payload is cut into 7-byte packets numbered from 1. The data-transfer frame
//! for packet `n` is `[n, d0..d6]` where `d` is the slice starting at
//! `(n - 1) * 7`; the unused tail of the last packet is padded with `0xFF`.
use crate::core::MAX_TP_PAYLOAD;

/// Payload bytes carried by one data-transfer frame.
pub const BYTES_PER_PACKET: usize = 7;

const PADDING: u8 = 0xFF;

/// Number of data-transfer frames needed for `len` bytes.
#[inline]
pub const fn packet_count(len: usize) -> usize {
    len.div_ceil(BYTES_PER_PACKET)
}

/// Result of feeding one data-transfer frame to [`Session::accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcceptResult {
    /// Not the expected sequence number (or nothing left to receive); state unchanged.
    SequenceMismatch,
    /// Stored; more packets are expected.
    FragmentConsumed,
    /// Stored; the payload is complete.
    MessageComplete,
}

/// Buffer plus progress counters. Owned by exactly one connection at a time.
#[derive(Debug, Clone)]
pub struct Session {
    buffer: [u8; MAX_TP_PAYLOAD],
    total_size: usize,
    total_packets: u8,
    next_sequence: u16,
    bytes_remaining: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_TP_PAYLOAD],
            total_size: 0,
            total_packets: 0,
            next_sequence: 1,
            bytes_remaining: 0,
        }
    }

    /// Load an outgoing payload (clamped to the buffer) and rewind to packet 1.
    pub fn start_send(&mut self, payload: &[u8]) {
        let len = payload.len().min(MAX_TP_PAYLOAD);
        self.buffer[..len].copy_from_slice(&payload[..len]);
        self.total_size = len;
        self.total_packets = packet_count(len) as u8;
        self.next_sequence = 1;
        self.bytes_remaining = len;
    }

    /// Prepare to receive `total_size` bytes announced in `total_packets` packets.
    pub fn start_receive(&mut self, total_size: usize, total_packets: u8) {
        self.total_size = total_size.min(MAX_TP_PAYLOAD);
        self.total_packets = total_packets;
        self.next_sequence = 1;
        self.bytes_remaining = self.total_size;
    }

    /// Next data-transfer frame to send, or `None` once everything went out.
    pub fn next_segment(&mut self) -> Option<[u8; 8]> {
        if self.bytes_remaining == 0 {
            return None;
        }
        let offset = (self.next_sequence as usize - 1) * BYTES_PER_PACKET;
        let take = self.bytes_remaining.min(BYTES_PER_PACKET);

        let mut frame = [PADDING; 8];
        frame[0] = self.next_sequence as u8;
        frame[1..1 + take].copy_from_slice(&self.buffer[offset..offset + take]);

        self.bytes_remaining -= take;
        self.next_sequence += 1;
        Some(frame)
    }

    /// Store the packet `sequence` if it is the expected one.
    pub fn accept(&mut self, sequence: u8, chunk: &[u8]) -> AcceptResult {
        if self.bytes_remaining == 0 || sequence as u16 != self.next_sequence {
            return AcceptResult::SequenceMismatch;
        }
        let offset = (sequence as usize - 1) * BYTES_PER_PACKET;
        let take = self.bytes_remaining.min(BYTES_PER_PACKET);
        let copied = take.min(chunk.len());
        self.buffer[offset..offset + copied].copy_from_slice(&chunk[..copied]);

        self.bytes_remaining -= take;
        self.next_sequence += 1;

        if self.bytes_remaining == 0 {
            AcceptResult::MessageComplete
        } else {
            AcceptResult::FragmentConsumed
        }
    }

    /// The full payload (complete only once `bytes_remaining` is zero).
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.buffer[..self.total_size]
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    #[inline]
    pub fn total_packets(&self) -> u8 {
        self.total_packets
    }

    #[inline]
    pub fn next_sequence(&self) -> u16 {
        self.next_sequence
    }

    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.bytes_remaining
    }
}
