//! Runtime configuration of a node.
use crate::error::InitError;
use crate::protocol::managment::iso_name::IsoName;
use crate::protocol::transport::tp::SequenceMismatch;
use crate::protocol::ADDRESS_MAX_CLAIMABLE;

/// Default update period (ms).
pub const DEFAULT_TICK_MS: u32 = 10;

/// Whether the node takes part in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeMode {
    /// Claims an address, runs the transport protocol, filters by destination.
    #[default]
    Active,
    /// Never transmits nor claims; every extended frame goes to the application.
    ListenOnly,
}

/// Initialization parameters of a node.
///
/// ```
/// use korri_j1939::protocol::managment::iso_name::IsoName;
/// use korri_j1939::protocol::node::config::{NodeConfig, NodeMode};
///
/// const NAME: IsoName = IsoName::builder().identity_number(42).function(130).build();
/// const CONFIG: NodeConfig = NodeConfig::new(NAME, 0x80).with_tick_ms(5);
///
/// assert_eq!(CONFIG.tick_ms, 5);
/// assert_eq!(CONFIG.mode, NodeMode::Active);
/// assert!(CONFIG.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub name: IsoName,
    /// Address claimed at startup (0..=253).
    pub preferred_address: u8,
    /// Period between two `update` calls; every engine timer advances by this much.
    pub tick_ms: u32,
    pub mode: NodeMode,
    pub sequence_mismatch: SequenceMismatch,
}

impl NodeConfig {
    pub const fn new(name: IsoName, preferred_address: u8) -> Self {
        Self {
            name,
            preferred_address,
            tick_ms: DEFAULT_TICK_MS,
            mode: NodeMode::Active,
            sequence_mismatch: SequenceMismatch::Ignore,
        }
    }

    pub const fn with_tick_ms(mut self, tick_ms: u32) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    pub const fn with_mode(mut self, mode: NodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn listen_only(self) -> Self {
        self.with_mode(NodeMode::ListenOnly)
    }

    pub const fn with_sequence_mismatch(mut self, policy: SequenceMismatch) -> Self {
        self.sequence_mismatch = policy;
        self
    }

    /// Check the parameters without touching any state.
    pub fn validate(&self) -> Result<(), InitError> {
        if self.preferred_address > ADDRESS_MAX_CLAIMABLE {
            return Err(InitError::InvalidAddress {
                address: self.preferred_address,
            });
        }
        if self.tick_ms == 0 {
            return Err(InitError::InvalidTickPeriod);
        }
        Ok(())
    }
}
