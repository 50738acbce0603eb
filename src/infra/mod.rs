//! Infrastructure shared by the protocol engines (byte/bit codecs).
pub mod codec;
