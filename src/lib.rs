//! `korri-j1939` library: a `no_std`, allocation-free SAE J1939 stack.
//! It covers address claim, the transport protocol (BAM and RTS/CTS), the
//! CAN identifier codec, and a tick-driven node dispatcher that talks to the
//! hardware and the application through the [`J1939Link`] capability trait.
//!
//! [`J1939Link`]: protocol::transport::traits::link::J1939Link
#![no_std]
#[cfg(test)]
#[macro_use]
extern crate std;
//==================================================================================
/// Message and payload types shared by the engines and the application boundary.
pub mod core;
/// Error types (initialization, transmission, wire decoding).
pub mod error;
/// Byte/bit decoding helpers for fixed-layout CAN payloads.
pub mod infra;
/// J1939 protocol implementation: transport, network management, node dispatch.
pub mod protocol;
//==================================================================================
