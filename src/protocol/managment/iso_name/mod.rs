//! J1939 NAME (64 bits). The NAME uniquely identifies a control application on
//! the network and arbitrates address contention: compared as an unsigned
//! integer, the lower NAME wins.
//!
//! # Bit layout (transmitted little endian)
//!
//! ```text
//! Bits  0-20  (21 bits) : Identity number
//! Bits 21-31  (11 bits) : Manufacturer code
//! Bits 32-34  ( 3 bits) : ECU instance
//! Bits 35-39  ( 5 bits) : Function instance
//! Bits 40-47  ( 8 bits) : Function
//! Bit  48     ( 1 bit ) : Reserved
//! Bits 49-55  ( 7 bits) : Vehicle system
//! Bits 56-59  ( 4 bits) : Vehicle system instance
//! Bits 60-62  ( 3 bits) : Industry group
//! Bit  63     ( 1 bit ) : Arbitrary Address Capable
//! ```
use crate::error::ExtractionError;
use core::fmt;

/// Wrapper around the raw 64-bit NAME.
///
/// # Example
///
/// ```
/// use korri_j1939::protocol::managment::iso_name::IsoName;
///
/// let name = IsoName::builder()
///     .identity_number(123456)
///     .manufacturer_code(275)
///     .function(130)
///     .vehicle_system(25)
///     .arbitrary_address_capable(true)
///     .build();
///
/// assert_eq!(name.identity_number(), 123456);
/// assert_eq!(name.manufacturer_code(), 275);
/// assert!(name.is_arbitrary_address_capable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsoName(u64);

impl IsoName {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Create a builder with every field cleared.
    #[inline]
    pub const fn builder() -> IsoNameBuilder {
        IsoNameBuilder::new()
    }

    /// Wire form carried by Address Claimed frames.
    #[inline]
    pub const fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Decode the payload of an Address Claimed frame (exactly eight bytes).
    pub fn from_payload(payload: &[u8]) -> Result<Self, ExtractionError> {
        let bytes: [u8; 8] = payload
            .try_into()
            .map_err(|_| ExtractionError::InvalidDataLen)?;
        Ok(Self(u64::from_le_bytes(bytes)))
    }

    /// Identity number (bits 0-20).
    #[inline]
    pub const fn identity_number(&self) -> u32 {
        (self.0 & 0x1F_FFFF) as u32
    }

    /// Manufacturer code (bits 21-31).
    #[inline]
    pub const fn manufacturer_code(&self) -> u16 {
        ((self.0 >> 21) & 0x7FF) as u16
    }

    /// ECU instance (bits 32-34).
    #[inline]
    pub const fn ecu_instance(&self) -> u8 {
        ((self.0 >> 32) & 0x07) as u8
    }

    /// Function instance (bits 35-39).
    #[inline]
    pub const fn function_instance(&self) -> u8 {
        ((self.0 >> 35) & 0x1F) as u8
    }

    /// Function (bits 40-47).
    #[inline]
    pub const fn function(&self) -> u8 {
        ((self.0 >> 40) & 0xFF) as u8
    }

    #[inline]
    pub const fn reserved(&self) -> bool {
        ((self.0 >> 48) & 0x01) != 0
    }

    /// Vehicle system (bits 49-55).
    #[inline]
    pub const fn vehicle_system(&self) -> u8 {
        ((self.0 >> 49) & 0x7F) as u8
    }

    /// Vehicle system instance (bits 56-59).
    #[inline]
    pub const fn vehicle_system_instance(&self) -> u8 {
        ((self.0 >> 56) & 0x0F) as u8
    }

    /// Industry group (bits 60-62). `0` = global, `1` = on-highway, `2` = agricultural.
    #[inline]
    pub const fn industry_group(&self) -> u8 {
        ((self.0 >> 60) & 0x07) as u8
    }

    /// Arbitrary Address Capable bit (bit 63).
    #[inline]
    pub const fn is_arbitrary_address_capable(&self) -> bool {
        ((self.0 >> 63) & 0x01) != 0
    }
}

impl From<u64> for IsoName {
    #[inline]
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<IsoName> for u64 {
    #[inline]
    fn from(name: IsoName) -> Self {
        name.raw()
    }
}

impl fmt::Display for IsoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IsoName {{ identity: {}, mfg: {}, func: {}, system: {}, ecu: {}, aac: {} }}",
            self.identity_number(),
            self.manufacturer_code(),
            self.function(),
            self.vehicle_system(),
            self.ecu_instance(),
            self.is_arbitrary_address_capable()
        )
    }
}

//==================================================================================BUILDER
/// `const` builder for an [`IsoName`]. Setters panic when a value does not fit
/// its field, which turns a bad constant NAME into a compile error.
#[derive(Debug, Clone, Copy)]
pub struct IsoNameBuilder {
    raw: u64,
}

impl IsoNameBuilder {
    #[inline]
    pub const fn new() -> Self {
        Self { raw: 0 }
    }

    #[inline]
    const fn with_field(mut self, value: u64, mask: u64, shift: u32) -> Self {
        self.raw = (self.raw & !(mask << shift)) | ((value & mask) << shift);
        self
    }

    /// # Panics
    /// When the value does not fit in 21 bits.
    #[inline]
    pub const fn identity_number(self, value: u32) -> Self {
        assert!(value <= 0x1F_FFFF, "Identity number must fit in 21 bits");
        self.with_field(value as u64, 0x1F_FFFF, 0)
    }

    /// # Panics
    /// When the value does not fit in 11 bits.
    #[inline]
    pub const fn manufacturer_code(self, value: u16) -> Self {
        assert!(value <= 0x7FF, "Manufacturer code must fit in 11 bits");
        self.with_field(value as u64, 0x7FF, 21)
    }

    /// # Panics
    /// When the value does not fit in 3 bits.
    #[inline]
    pub const fn ecu_instance(self, value: u8) -> Self {
        assert!(value <= 0x07, "ECU instance must fit in 3 bits");
        self.with_field(value as u64, 0x07, 32)
    }

    /// # Panics
    /// When the value does not fit in 5 bits.
    #[inline]
    pub const fn function_instance(self, value: u8) -> Self {
        assert!(value <= 0x1F, "Function instance must fit in 5 bits");
        self.with_field(value as u64, 0x1F, 35)
    }

    #[inline]
    pub const fn function(self, value: u8) -> Self {
        self.with_field(value as u64, 0xFF, 40)
    }

    #[inline]
    pub const fn reserved(self, value: bool) -> Self {
        self.with_field(value as u64, 0x01, 48)
    }

    /// # Panics
    /// When the value does not fit in 7 bits.
    #[inline]
    pub const fn vehicle_system(self, value: u8) -> Self {
        assert!(value <= 0x7F, "Vehicle system must fit in 7 bits");
        self.with_field(value as u64, 0x7F, 49)
    }

    /// # Panics
    /// When the value does not fit in 4 bits.
    #[inline]
    pub const fn vehicle_system_instance(self, value: u8) -> Self {
        assert!(value <= 0x0F, "Vehicle system instance must fit in 4 bits");
        self.with_field(value as u64, 0x0F, 56)
    }

    /// # Panics
    /// When the value does not fit in 3 bits.
    #[inline]
    pub const fn industry_group(self, value: u8) -> Self {
        assert!(value <= 0x07, "Industry group must fit in 3 bits");
        self.with_field(value as u64, 0x07, 60)
    }

    #[inline]
    pub const fn arbitrary_address_capable(self, value: bool) -> Self {
        self.with_field(value as u64, 0x01, 63)
    }

    #[inline]
    pub const fn build(self) -> IsoName {
        IsoName(self.raw)
    }
}

impl Default for IsoNameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
