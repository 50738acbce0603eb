//! Little-endian bit reader over CAN payloads.
//!
//! J1939 control frames pack fields LSB first: a 24-bit PGN spans bytes 5-7,
//! lengths are 16-bit little-endian. The reader extracts such fields by width
//! without copying the buffer.
use crate::error::BitReaderError;

/// Reader that extracts bit segments from a `&[u8]`, least significant bit first.
pub struct BitReader<'a> {
    /// Source buffer (typically a received frame payload).
    buffer: &'a [u8],
    /// Number of bits consumed from the start of the buffer.
    bit_cursor: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the start of the provided buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Bits still available after the cursor.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.bit_cursor
    }

    fn ensure_available(&self, bits: usize) -> Result<(), BitReaderError> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(BitReaderError::OutOfBounds {
                asked: bits,
                available,
            });
        }
        Ok(())
    }

    /// Read `num_bits` (1..=64) from the cursor and return them as a `u64`.
    pub fn read_u64(&mut self, num_bits: u8) -> Result<u64, BitReaderError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitReaderError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }
        self.ensure_available(num_bits as usize)?;

        let mut value: u64 = 0;
        let mut filled = 0usize;
        while filled < num_bits as usize {
            let position = self.bit_cursor + filled;
            let offset = position % 8;
            let take = (8 - offset).min(num_bits as usize - filled);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (self.buffer[position / 8] >> offset) & mask;
            value |= (chunk as u64) << filled;
            filled += take;
        }

        self.bit_cursor += num_bits as usize;
        Ok(value)
    }

    /// Read up to 8 bits.
    pub fn read_u8(&mut self, num_bits: u8) -> Result<u8, BitReaderError> {
        if num_bits > 8 {
            return Err(BitReaderError::TooLongForType {
                max: 8,
                asked: num_bits,
            });
        }
        self.read_u64(num_bits).map(|v| v as u8)
    }

    /// Read up to 16 bits.
    pub fn read_u16(&mut self, num_bits: u8) -> Result<u16, BitReaderError> {
        if num_bits > 16 {
            return Err(BitReaderError::TooLongForType {
                max: 16,
                asked: num_bits,
            });
        }
        self.read_u64(num_bits).map(|v| v as u16)
    }

    /// Read up to 32 bits (PGN fields use 24).
    pub fn read_u32(&mut self, num_bits: u8) -> Result<u32, BitReaderError> {
        if num_bits > 32 {
            return Err(BitReaderError::TooLongForType {
                max: 32,
                asked: num_bits,
            });
        }
        self.read_u64(num_bits).map(|v| v as u32)
    }

    /// Skip `length` bits (reserved fields).
    pub fn advance(&mut self, length: u8) -> Result<(), BitReaderError> {
        if !(1..=64).contains(&length) {
            return Err(BitReaderError::TooLongForType {
                max: 64,
                asked: length,
            });
        }
        self.ensure_available(length as usize)?;
        self.bit_cursor += length as usize;
        Ok(())
    }
}
