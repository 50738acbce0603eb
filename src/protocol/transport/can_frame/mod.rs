//! In-memory representation of a classic CAN frame carrying J1939 traffic,
//! plus the bridge to `embedded_can::Frame` so HAL drivers can hand frames
//! over without conversion code on the application side.
use crate::core::{Message, MAX_FRAME_PAYLOAD};
use crate::protocol::transport::can_id::{CanId, EXTENDED_FRAME_FLAG};
use embedded_can::{ExtendedId, Frame, Id, StandardId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw frame as read from or written to the CAN bus.
pub struct CanFrame {
    /// Identifier word; bit 31 flags an extended identifier.
    pub id: CanId,
    /// Payload buffer. Classic CAN frames always provide eight bytes.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from an identifier and up to eight payload bytes.
    pub fn new(id: CanId, payload: &[u8]) -> Option<Self> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return None;
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Some(Self {
            id,
            data,
            len: payload.len(),
        })
    }

    /// Encode a single-frame message. `None` when the payload needs segmentation.
    pub fn from_message(message: &Message<'_>) -> Option<Self> {
        let id = CanId::builder(message.pgn, message.source)
            .with_priority(message.priority)
            .to_destination(message.destination)
            .build();
        Self::new(id, message.data)
    }

    /// Valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(MAX_FRAME_PAYLOAD)]
    }
}

//==================================================================================EMBEDDED_CAN
impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let raw = match id.into() {
            Id::Extended(extended) => extended.as_raw() | EXTENDED_FRAME_FLAG,
            Id::Standard(standard) => standard.as_raw() as u32,
        };
        CanFrame::new(CanId(raw), data)
    }

    /// Remote frames have no J1939 meaning.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.id.is_extended()
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        if self.id.is_extended() {
            let raw = self.id.0 & ExtendedId::MAX.as_raw();
            Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::ZERO))
        } else {
            let raw = (self.id.0 & StandardId::MAX.as_raw() as u32) as u16;
            Id::Standard(StandardId::new(raw).unwrap_or(StandardId::ZERO))
        }
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
