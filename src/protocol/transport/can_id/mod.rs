//! Creation and extraction of the 29-bit extended CAN identifiers used by
//! SAE J1939.
//!
//! ```text
//! bit  31     : extended-frame marker (always set on encode)
//! bits 26-28  : priority
//! bit  24     : data page
//! bits 16-23  : PDU format (PF)
//! bits  8-15  : PDU specific (PS): destination if PF < 240, PGN low byte otherwise
//! bits  0-7   : source address
//! ```
use crate::protocol::ADDRESS_GLOBAL;

/// Marker bit flagging an extended (29-bit) identifier.
pub const EXTENDED_FRAME_FLAG: u32 = 1 << 31;

/// PF values below this threshold are destination-specific (PDU1).
const PDU2_THRESHOLD: u8 = 240;

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw identifier word with accessors for the J1939 routing fields.
pub struct CanId(pub u32);

impl CanId {
    /// Creates a pre-configured `CanIdBuilder` for a PGN and source address.
    pub fn builder(pgn: u32, source_address: u8) -> CanIdBuilder {
        CanIdBuilder::new(pgn, source_address)
    }

    /// `false` for legacy standard frames, which carry no PGN semantics.
    #[inline]
    pub fn is_extended(&self) -> bool {
        self.0 & EXTENDED_FRAME_FLAG != 0
    }

    /// Priority (3 bits, value 0-7).
    #[inline]
    pub fn priority(&self) -> u8 {
        ((self.0 >> 26) & 0x07) as u8
    }

    #[inline]
    pub fn data_page(&self) -> u8 {
        ((self.0 >> 24) & 0x01) as u8
    }

    #[inline]
    pub fn pdu_format(&self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    #[inline]
    pub fn pdu_specific(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// `true` for destination-specific identifiers (PF < 240).
    #[inline]
    pub fn is_pdu1(&self) -> bool {
        self.pdu_format() < PDU2_THRESHOLD
    }

    /// PGN rebuilt from data page, PF and (PDU2 only) PS.
    pub fn pgn(&self) -> u32 {
        let base = ((self.data_page() as u32) << 16) | ((self.pdu_format() as u32) << 8);
        if self.is_pdu1() {
            base
        } else {
            base | self.pdu_specific() as u32
        }
    }

    /// Destination address: PS for PDU1, global for PDU2.
    pub fn destination(&self) -> u8 {
        if self.is_pdu1() {
            self.pdu_specific()
        } else {
            ADDRESS_GLOBAL
        }
    }

    /// Eight-bit source address.
    #[inline]
    pub fn source_address(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

//==================================================================================CAN_ID_BUILDER
#[derive(Debug, Clone, Copy)]
/// Fluent builder applying the PDU1/PDU2 rules.
pub struct CanIdBuilder {
    pub priority: u8,
    pub pgn: u32,
    pub source_address: u8,
    pub destination: u8,
}

impl CanIdBuilder {
    /// Initializes the builder for a given PGN and source address
    /// (priority 6, global destination).
    pub fn new(pgn: u32, source_address: u8) -> Self {
        Self {
            priority: 6,
            pgn,
            source_address,
            destination: ADDRESS_GLOBAL,
        }
    }

    /// Sets the priority; only the three low bits are kept.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority & 0x07;
        self
    }

    /// Sets the destination. Ignored for PDU2 PGNs, whose PS byte is part of the PGN.
    pub fn to_destination(mut self, destination_address: u8) -> Self {
        self.destination = destination_address;
        self
    }

    /// Builds the identifier with the extended marker set.
    pub fn build(self) -> CanId {
        let dp = (self.pgn >> 16) & 0x01;
        let pf = ((self.pgn >> 8) & 0xFF) as u8;
        let ps = if pf < PDU2_THRESHOLD {
            self.destination
        } else {
            (self.pgn & 0xFF) as u8
        };

        CanId(
            EXTENDED_FRAME_FLAG
                | ((self.priority as u32) << 26)
                | (dp << 24)
                | ((pf as u32) << 16)
                | ((ps as u32) << 8)
                | self.source_address as u32,
        )
    }
}
