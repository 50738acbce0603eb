//! Network management: NAME handling and the address-claim state machine.
pub mod address_claiming;
pub mod iso_name;
