use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::wire::types::{FixedV4, MacAddress};

/// A binding from a MAC address to an IP address, valid until `expiration`.
///
/// Field names match the on-disk persistence format exactly (see
/// [`crate::pool::persistence`]), which predates this implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lease {
    #[serde(rename = "Mac")]
    pub mac: MacAddress,
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "IP")]
    pub ip: FixedV4,
    #[serde(rename = "Expiration", with = "time::serde::rfc3339")]
    pub expiration: OffsetDateTime,
}

impl Lease {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration < now
    }
}
