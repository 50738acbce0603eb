//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (node initialization,
//! transmission, wire decoding, etc.). Nothing in the core panics or unwinds:
//! every failure is returned as one of these values or reflected as a state flag.
use thiserror_no_std::Error;

//==================================================================================INIT_ERROR
#[derive(Error, Debug, PartialEq, Eq)]
/// Reasons a node could not be registered. No state is mutated when one is returned.
pub enum InitError {
    /// Every registry slot is already taken.
    #[error("Node registry is full")]
    RegistryFull,
    /// Preferred address outside 0..=253.
    #[error("Invalid preferred address: {address}")]
    InvalidAddress { address: u8 },
    /// The update tick must be strictly positive.
    #[error("Tick period must be greater than zero")]
    InvalidTickPeriod,
}

//==================================================================================SEND_ERROR
#[derive(Error, Debug, PartialEq, Eq)]
/// Errors encountered when handing a message to the stack for transmission.
pub enum SendError<E: core::fmt::Debug> {
    /// The node lost arbitration for good or is configured listen-only.
    #[error("Transmission disabled for this node")]
    TransmitDisabled,
    /// A transport-protocol connection is already open.
    #[error("A transport connection is already active")]
    ConnectionBusy,
    /// Multi-frame payloads must hold at least one byte.
    #[error("Payload is empty: unable to segment")]
    EmptyPayload,
    /// Payload exceeds the transport-protocol capacity.
    #[error("Payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },
    /// The handle does not designate a node of this registry.
    #[error("Unknown node handle")]
    UnknownNode,
    /// The link refused or failed to send the frame.
    #[error("Link send error: {0:?}")]
    Link(E),
}

//==================================================================================EXTRACTION_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// Failures while extracting information from a decoded message.
pub enum ExtractionError {
    /// Payload length does not match the PGN layout.
    #[error("Invalid data length for PGN")]
    InvalidDataLen,
}

//==================================================================================CM_DECODE_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// Errors raised while decoding a transport connection-management frame.
pub enum CmDecodeError {
    /// Connection-management frames are always eight bytes long.
    #[error("Invalid connection management length: {len}")]
    InvalidLength { len: usize },
    /// First byte is not one of the supported control bytes.
    #[error("Unknown control byte: {byte:#04X}")]
    UnknownControlByte { byte: u8 },
    /// Field access on the frame payload failed.
    #[error("BitReader error: {err}")]
    Reader { err: BitReaderError },
}

impl From<BitReaderError> for CmDecodeError {
    fn from(err: BitReaderError) -> Self {
        Self::Reader { err }
    }
}

//==================================================================================CHANNEL_LINK_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// Errors reported by the channel-backed link.
pub enum ChannelLinkError {
    /// The outgoing frame queue has no room left.
    #[error("Outgoing frame queue is full")]
    TxQueueFull,
}

//==================================================================================BITREADER_ERRORS
#[derive(Debug, Error, PartialEq, Eq)]
/// Errors raised during bitwise buffer reads.
pub enum BitReaderError {
    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Requested more bits than the target type can hold.
    #[error("Cannot read more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
}
