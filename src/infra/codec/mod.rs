//! Low-level decoding helpers for fixed-layout CAN payloads.
pub mod bits;
