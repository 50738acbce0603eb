//! Blocking delay used once at node initialization, when the preferred
//! address lies in the self-configurable range and other claims must settle
//! before the node proceeds.

/// Blocks the caller for the requested duration.
pub trait StartupDelay {
    fn delay_ms(&mut self, millis: u32);
}
