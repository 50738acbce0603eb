//! J1939 transport layer: CAN frame representation, 29-bit identifier codec,
//! the multi-packet transport protocol, and the link abstraction.
//!
//! ## Transport protocol timing
//!
//! All timers advance by the node's tick increment only; no wall clock is
//! sampled inside the stack.

pub mod can_frame;
pub mod can_id;
pub mod channel_link;
pub mod tp;
pub mod traits;

/// Priority of every connection-management and data-transfer frame.
pub const TP_PRIORITY: u8 = 7;

/// Interval between two data-transfer frames sent by this node (ms).
///
/// Also the delay before a receiver answers an RTS with its CTS.
pub const TP_PACKET_PERIOD_MS: u32 = 50;

/// TR: how long a peer-to-peer sender waits for the CTS (ms).
pub const TP_TIMEOUT_TR_MS: u32 = 200;

/// T1: how long a receiver waits for the next data-transfer frame (ms).
pub const TP_TIMEOUT_T1_MS: u32 = 1250;

/// T3: how long a peer-to-peer sender waits for the end-of-message ACK (ms).
pub const TP_TIMEOUT_T3_MS: u32 = 1250;
