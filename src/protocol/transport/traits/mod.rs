//! Capability traits the embedding application supplies (bus link and startup delay).
pub mod link;
pub mod startup_delay;
