//! SAE J1939 address-claim state machine: claim a preferred address, defend it
//! against lower-priority NAMEs, move to the next free address after losing
//! arbitration, and fall back to the terminal Cannot-Claim state once the
//! address table is exhausted.
//!
//! The engine is passive: it reacts to Address Claimed frames and to Requests
//! for the Address Claimed PGN, both handed over by the node dispatcher.
use core::ops::RangeInclusive;

use crate::core::Message;
use crate::error::SendError;
use crate::protocol::managment::iso_name::IsoName;
use crate::protocol::node::port::NodePort;
use crate::protocol::transport::traits::link::J1939Link;
use crate::protocol::{ADDRESS_GLOBAL, ADDRESS_NULL, PGN_ADDRESS_CLAIMED};

/// Priority of Address Claimed and Cannot Claim Address frames.
pub const ADDRESS_CLAIM_PRIORITY: u8 = 6;

/// Settling time required before a self-configurable address may be used.
pub const STARTUP_SETTLE_MS: u32 = 250;

/// Addresses whose claim must settle for [`STARTUP_SETTLE_MS`] before proceeding.
pub const SELF_CONFIGURABLE_RANGE: RangeInclusive<u8> = 128..=247;

/// Number of claimable addresses (0..=253).
const TABLE_SIZE: usize = ADDRESS_NULL as usize;

/// `true` when claiming `address` requires the startup delay.
#[inline]
pub fn requires_startup_delay(address: u8) -> bool {
    SELF_CONFIGURABLE_RANGE.contains(&address)
}

//==================================================================================ADDRESS_TABLE
/// Occupancy of every claimable address as observed on the bus.
#[derive(Debug, Clone)]
pub struct AddressTable {
    occupied: [bool; TABLE_SIZE],
    available: u8,
}

impl Default for AddressTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressTable {
    /// Every slot free.
    pub const fn new() -> Self {
        Self {
            occupied: [false; TABLE_SIZE],
            available: TABLE_SIZE as u8,
        }
    }

    /// Forget every observed claim, keeping only `own` (when it is claimable).
    pub fn clear_except(&mut self, own: u8) {
        self.occupied = [false; TABLE_SIZE];
        self.available = TABLE_SIZE as u8;
        self.mark_occupied(own);
    }

    /// Mark a slot occupied. Repeated marks leave the free-slot counter untouched;
    /// 254 and 255 are ignored.
    pub fn mark_occupied(&mut self, address: u8) {
        if let Some(slot) = self.occupied.get_mut(address as usize) {
            if !*slot {
                *slot = true;
                self.available = self.available.saturating_sub(1);
            }
        }
    }

    pub fn is_occupied(&self, address: u8) -> bool {
        self.occupied.get(address as usize).copied().unwrap_or(true)
    }

    /// Free slots left.
    #[inline]
    pub fn available(&self) -> u8 {
        self.available
    }

    /// First free slot scanning upward from `current + 1`, wrapping at 254,
    /// for at most 253 steps. `None` when the counter says the table is full.
    pub fn next_free_after(&self, current: u8) -> Option<u8> {
        if self.available == 0 {
            return None;
        }
        (1..TABLE_SIZE)
            .map(|step| ((current as usize + step) % TABLE_SIZE) as u8)
            .find(|&candidate| !self.is_occupied(candidate))
    }
}

//==================================================================================CLAIM_STATE
/// Observable state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimState {
    /// Holding a tentative or confirmed address.
    Claimed,
    /// Terminal: address forced to 254, transmission disabled.
    CannotClaim,
}

/// What handling an incoming Address Claimed message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimOutcome {
    /// Malformed claim (payload not eight bytes), discarded.
    Ignored,
    /// The claim did not target our address.
    NoContention,
    /// We outrank the other node (or tie) and re-asserted our address.
    Defended,
    /// We lost and moved to `address`.
    Reclaimed { address: u8 },
    /// We lost and no address was left.
    CannotClaim,
}

impl ClaimOutcome {
    /// `true` when the node gave up the address it was using.
    #[inline]
    pub fn relinquished_address(&self) -> bool {
        matches!(self, Self::Reclaimed { .. } | Self::CannotClaim)
    }
}

//==================================================================================ADDRESS_CLAIM
/// Per-node address-claim engine.
#[derive(Debug, Clone)]
pub struct AddressClaim {
    name: IsoName,
    table: AddressTable,
    state: ClaimState,
}

impl AddressClaim {
    pub const fn new(name: IsoName) -> Self {
        Self {
            name,
            table: AddressTable::new(),
            state: ClaimState::Claimed,
        }
    }

    #[inline]
    pub fn name(&self) -> IsoName {
        self.name
    }

    #[inline]
    pub fn state(&self) -> ClaimState {
        self.state
    }

    #[inline]
    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    #[inline]
    #[cfg(test)]
    pub(crate) fn table_mut(&mut self) -> &mut AddressTable {
        &mut self.table
    }

    /// Take `preferred` as our address, reset the table around it and announce the claim.
    /// The settling delay for self-configurable addresses is the caller's job.
    pub fn init<L: J1939Link>(
        &mut self,
        port: &mut NodePort<L>,
        preferred: u8,
    ) -> Result<(), SendError<L::Error>> {
        port.set_source_address(preferred);
        self.table.clear_except(preferred);
        self.state = ClaimState::Claimed;

        #[cfg(feature = "defmt")]
        defmt::info!("Claiming address {}", preferred);

        self.send_claim(port)
    }

    /// Move to the next free address after the current one. Leaves the address
    /// untouched and returns `false` when none is free.
    pub fn update_address<L: J1939Link>(&mut self, port: &mut NodePort<L>) -> bool {
        match self.table.next_free_after(port.source_address()) {
            Some(address) => {
                port.set_source_address(address);
                self.table.mark_occupied(address);
                true
            }
            None => false,
        }
    }

    /// Handle an Address Claimed (or Cannot Claim) message from another node.
    pub fn on_address_claimed<L: J1939Link>(
        &mut self,
        port: &mut NodePort<L>,
        message: &Message<'_>,
    ) -> ClaimOutcome {
        let Ok(their_name) = IsoName::from_payload(message.data) else {
            return ClaimOutcome::Ignored;
        };

        let outcome =
            if self.state == ClaimState::Claimed && message.source == port.source_address() {
                self.resolve_contention(port, their_name)
            } else {
                ClaimOutcome::NoContention
            };

        if message.source < ADDRESS_NULL {
            self.table.mark_occupied(message.source);
        }
        outcome
    }

    fn resolve_contention<L: J1939Link>(
        &mut self,
        port: &mut NodePort<L>,
        their_name: IsoName,
    ) -> ClaimOutcome {
        if their_name >= self.name {
            #[cfg(feature = "defmt")]
            defmt::info!("Defending address {}", port.source_address());

            self.send_claim_logged(port);
            return ClaimOutcome::Defended;
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Lost address {} to a lower NAME", port.source_address());

        if self.update_address(port) {
            #[cfg(feature = "defmt")]
            defmt::info!("Reclaiming at address {}", port.source_address());

            self.send_claim_logged(port);
            ClaimOutcome::Reclaimed {
                address: port.source_address(),
            }
        } else {
            self.enter_cannot_claim(port);
            ClaimOutcome::CannotClaim
        }
    }

    /// Answer a Request for the Address Claimed PGN.
    pub fn on_request<L: J1939Link>(&mut self, port: &mut NodePort<L>) {
        match self.state {
            ClaimState::Claimed => {
                self.table.clear_except(port.source_address());
                self.send_claim_logged(port);
            }
            ClaimState::CannotClaim => {
                self.send_cannot_claim_logged(port);
            }
        }
    }

    fn enter_cannot_claim<L: J1939Link>(&mut self, port: &mut NodePort<L>) {
        #[cfg(feature = "defmt")]
        defmt::warn!("Address table exhausted: cannot claim an address");

        self.state = ClaimState::CannotClaim;
        port.set_source_address(ADDRESS_NULL);
        self.send_cannot_claim_logged(port);
        port.disable_transmit();
    }

    fn send_claim<L: J1939Link>(
        &self,
        port: &mut NodePort<L>,
    ) -> Result<(), SendError<L::Error>> {
        let name = self.name.to_le_bytes();
        port.transmit(&claim_message(port.source_address(), &name))
    }

    fn send_claim_logged<L: J1939Link>(&self, port: &mut NodePort<L>) {
        if let Err(_e) = self.send_claim(port) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Address claim transmission failed: {}", defmt::Debug2Format(&_e));
        }
    }

    fn send_cannot_claim_logged<L: J1939Link>(&self, port: &mut NodePort<L>) {
        if let Err(_e) = self.send_cannot_claim(port) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Cannot Claim transmission failed: {}", defmt::Debug2Format(&_e));
        }
    }

    /// Cannot Claim Address: same PGN, null source, bypasses the transmit gate.
    fn send_cannot_claim<L: J1939Link>(
        &self,
        port: &mut NodePort<L>,
    ) -> Result<(), SendError<L::Error>> {
        let name = self.name.to_le_bytes();
        port.transmit_unchecked(&claim_message(ADDRESS_NULL, &name))
    }
}

/// Address Claimed message carrying `name` from `source`.
pub fn claim_message(source: u8, name: &[u8; 8]) -> Message<'_> {
    Message::new(
        PGN_ADDRESS_CLAIMED,
        ADDRESS_CLAIM_PRIORITY,
        source,
        ADDRESS_GLOBAL,
        name,
    )
}
