//! Core types shared by the crawler crates: address validation, probe report
//! sections and the identity gate.

pub mod address;
pub mod gate;
pub mod report;

pub use address::{is_valid_v3_onion, AddressError, OnionAddress, ONION_SUFFIX};
pub use gate::{GateError, GateState, IdentityGate, RotationTicket};
pub use report::{IdentifierReport, ScanReport, SimpleReport};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
