//! SAE J1939 protocol layers: CAN transport and transport protocol,
//! network management (address claim, NAME), and the per-node dispatcher.
pub mod managment;
pub mod node;
pub mod transport;

//==================================================================================ADDRESSES
/// Destination meaning "every node".
pub const ADDRESS_GLOBAL: u8 = 255;
/// Source used by a node that holds no address.
pub const ADDRESS_NULL: u8 = 254;
/// Highest address a node may claim.
pub const ADDRESS_MAX_CLAIMABLE: u8 = 253;

//==================================================================================PGNS
/// Request PGN (payload = 3-byte little-endian requested PGN).
pub const PGN_REQUEST: u32 = 0x00EA00;
/// Address Claimed / Cannot Claim Address.
pub const PGN_ADDRESS_CLAIMED: u32 = 0x00EE00;
/// Transport protocol, connection management.
pub const PGN_TP_CM: u32 = 0x00EC00;
/// Transport protocol, data transfer.
pub const PGN_TP_DT: u32 = 0x00EB00;
