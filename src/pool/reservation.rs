use crate::wire::types::{FixedV4, MacAddress};

/// A static MAC→IP mapping that overrides the pool's free-address scan.
/// Immutable once a pool is built; installed only at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub mac: MacAddress,
    pub ip: FixedV4,
    pub hostname: String,
}
