//! Connection-management frames of the transport protocol (PGN 0x00EC00).
//!
//! Every frame is eight bytes, tagged by its first (control) byte. Multi-byte
//! fields are little endian, the PGN of the transferred message sits in bytes 5-7,
//! and reserved bytes are sent as `0xFF`.
//!
//! ```text
//! RTS   : [16, size_lo, size_hi, packets, max_packets, pgn0, pgn1, pgn2]
//! CTS   : [17, packets, next_seq, 0xFF, 0xFF, pgn0, pgn1, pgn2]
//! ACK   : [19, size_lo, size_hi, packets, 0xFF, pgn0, pgn1, pgn2]
//! BAM   : [32, size_lo, size_hi, packets, 0xFF, pgn0, pgn1, pgn2]
//! ABORT : [255, reason, 0xFF, 0xFF, 0xFF, pgn0, pgn1, pgn2]
//! ```
use crate::error::CmDecodeError;
use crate::infra::codec::bits::BitReader;

pub const CONTROL_RTS: u8 = 16;
pub const CONTROL_CTS: u8 = 17;
pub const CONTROL_ACK: u8 = 19;
pub const CONTROL_BAM: u8 = 32;
pub const CONTROL_ABORT: u8 = 255;

/// Value announced in the RTS "maximum packets per CTS" field (no limit).
pub const RTS_MAX_PACKETS: u8 = 0xFF;

const CM_LEN: usize = 8;
const RESERVED: u8 = 0xFF;

//==================================================================================ABORT_REASON
/// Why a connection was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AbortReason {
    /// Already in one connection, cannot open another.
    Busy = 0,
    /// Not enough resources for the announced message.
    Resources = 1,
    /// A timer expired.
    Timeout = 2,
    /// Any other failure (e.g. unexpected sequence number).
    Other = 3,
}

impl AbortReason {
    /// Unknown codes collapse to [`AbortReason::Other`].
    pub fn from_wire(code: u8) -> Self {
        match code {
            0 => Self::Busy,
            1 => Self::Resources,
            2 => Self::Timeout,
            _ => Self::Other,
        }
    }
}

//==================================================================================CONNECTION_MANAGEMENT
/// Decoded connection-management frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionManagement {
    RequestToSend {
        total_size: u16,
        total_packets: u8,
        max_packets: u8,
        pgn: u32,
    },
    ClearToSend {
        packets: u8,
        next_sequence: u8,
        pgn: u32,
    },
    EndOfMessageAck {
        total_size: u16,
        total_packets: u8,
        pgn: u32,
    },
    BroadcastAnnounce {
        total_size: u16,
        total_packets: u8,
        pgn: u32,
    },
    Abort {
        reason: AbortReason,
        pgn: u32,
    },
}

impl ConnectionManagement {
    /// PGN of the message being transferred.
    pub fn pgn(&self) -> u32 {
        match *self {
            Self::RequestToSend { pgn, .. }
            | Self::ClearToSend { pgn, .. }
            | Self::EndOfMessageAck { pgn, .. }
            | Self::BroadcastAnnounce { pgn, .. }
            | Self::Abort { pgn, .. } => pgn,
        }
    }

    /// Control byte tagging this variant.
    pub fn control_byte(&self) -> u8 {
        match self {
            Self::RequestToSend { .. } => CONTROL_RTS,
            Self::ClearToSend { .. } => CONTROL_CTS,
            Self::EndOfMessageAck { .. } => CONTROL_ACK,
            Self::BroadcastAnnounce { .. } => CONTROL_BAM,
            Self::Abort { .. } => CONTROL_ABORT,
        }
    }

    /// Pack into the eight-byte wire layout.
    pub fn encode(&self) -> [u8; 8] {
        let head = match *self {
            Self::RequestToSend {
                total_size,
                total_packets,
                max_packets,
                ..
            } => {
                let [lo, hi] = total_size.to_le_bytes();
                [CONTROL_RTS, lo, hi, total_packets, max_packets]
            }
            Self::ClearToSend {
                packets,
                next_sequence,
                ..
            } => [CONTROL_CTS, packets, next_sequence, RESERVED, RESERVED],
            Self::EndOfMessageAck {
                total_size,
                total_packets,
                ..
            } => {
                let [lo, hi] = total_size.to_le_bytes();
                [CONTROL_ACK, lo, hi, total_packets, RESERVED]
            }
            Self::BroadcastAnnounce {
                total_size,
                total_packets,
                ..
            } => {
                let [lo, hi] = total_size.to_le_bytes();
                [CONTROL_BAM, lo, hi, total_packets, RESERVED]
            }
            Self::Abort { reason, .. } => [CONTROL_ABORT, reason as u8, RESERVED, RESERVED, RESERVED],
        };

        let pgn = self.pgn().to_le_bytes();
        [head[0], head[1], head[2], head[3], head[4], pgn[0], pgn[1], pgn[2]]
    }

    /// Parse a connection-management payload.
    pub fn decode(data: &[u8]) -> Result<Self, CmDecodeError> {
        if data.len() != CM_LEN {
            return Err(CmDecodeError::InvalidLength { len: data.len() });
        }
        let mut reader = BitReader::new(data);
        let control = reader.read_u8(8)?;

        let decoded = match control {
            CONTROL_RTS => Self::RequestToSend {
                total_size: reader.read_u16(16)?,
                total_packets: reader.read_u8(8)?,
                max_packets: reader.read_u8(8)?,
                pgn: reader.read_u32(24)?,
            },
            CONTROL_CTS => {
                let packets = reader.read_u8(8)?;
                let next_sequence = reader.read_u8(8)?;
                reader.advance(16)?;
                Self::ClearToSend {
                    packets,
                    next_sequence,
                    pgn: reader.read_u32(24)?,
                }
            }
            CONTROL_ACK | CONTROL_BAM => {
                let total_size = reader.read_u16(16)?;
                let total_packets = reader.read_u8(8)?;
                reader.advance(8)?;
                let pgn = reader.read_u32(24)?;
                if control == CONTROL_ACK {
                    Self::EndOfMessageAck {
                        total_size,
                        total_packets,
                        pgn,
                    }
                } else {
                    Self::BroadcastAnnounce {
                        total_size,
                        total_packets,
                        pgn,
                    }
                }
            }
            CONTROL_ABORT => {
                let reason = AbortReason::from_wire(reader.read_u8(8)?);
                reader.advance(24)?;
                Self::Abort {
                    reason,
                    pgn: reader.read_u32(24)?,
                }
            }
            byte => return Err(CmDecodeError::UnknownControlByte { byte }),
        };
        Ok(decoded)
    }
}
