use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// A 32-bit big-endian IPv4 address, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixedV4(u32);

impl FixedV4 {
    pub const UNSPECIFIED: FixedV4 = FixedV4(0);

    pub fn from_bytes(b: [u8; 4]) -> Self {
        FixedV4(u32::from_be_bytes(b))
    }

    pub fn bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn to_u32(self) -> u32 {
        self.0
    }

    pub fn from_u32(v: u32) -> Self {
        FixedV4(v)
    }

    pub fn is_unspecified(self) -> bool {
        self.0 == 0
    }
}

impl From<Ipv4Addr> for FixedV4 {
    fn from(ip: Ipv4Addr) -> Self {
        FixedV4(u32::from(ip))
    }
}

impl From<FixedV4> for Ipv4Addr {
    fn from(v: FixedV4) -> Self {
        Ipv4Addr::from(v.0)
    }
}

impl TryFrom<&[u8]> for FixedV4 {
    type Error = CodecError;

    fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
        let b: [u8; 4] = b
            .try_into()
            .map_err(|_| CodecError::BadLength("FixedV4", b.len()))?;
        Ok(FixedV4::from_bytes(b))
    }
}

impl FromStr for FixedV4 {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ip: Ipv4Addr = s.parse().map_err(|_| CodecError::BadAddress(s.to_string()))?;
        Ok(FixedV4::from(ip))
    }
}

impl TryFrom<String> for FixedV4 {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FixedV4> for String {
    fn from(v: FixedV4) -> Self {
        v.to_string()
    }
}

impl fmt::Display for FixedV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ip: Ipv4Addr = (*self).into();
        write!(f, "{ip}")
    }
}

/// A 6-byte Ethernet hardware address, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn from_bytes(b: [u8; 6]) -> Self {
        MacAddress(b)
    }

    pub fn bytes(self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(CodecError::BadAddress(s.to_string()));
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| CodecError::BadAddress(s.to_string()))?;
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(m: MacAddress) -> Self {
        m.to_string()
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = CodecError;

    fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
        let b: [u8; 6] = b
            .try_into()
            .map_err(|_| CodecError::BadLength("MacAddress", b.len()))?;
        Ok(MacAddress(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_v4_roundtrips_through_dotted_quad() {
        let v = FixedV4::from_str("10.0.0.10").unwrap();
        assert_eq!(v.to_string(), "10.0.0.10");
        assert_eq!(v.bytes(), [10, 0, 0, 10]);
    }

    #[test]
    fn fixed_v4_unspecified_is_zero() {
        assert!(FixedV4::UNSPECIFIED.is_unspecified());
        assert!(!FixedV4::from_str("0.0.0.1").unwrap().is_unspecified());
    }

    #[test]
    fn mac_address_formats_as_lowercase_colon_hex() {
        let mac = MacAddress::from_bytes([0x00, 0x1c, 0x42, 0xb4, 0x6e, 0x1d]);
        assert_eq!(mac.to_string(), "00:1c:42:b4:6e:1d");
    }

    #[test]
    fn mac_address_parses_back() {
        let mac: MacAddress = "00:1c:42:b4:6e:1d".parse().unwrap();
        assert_eq!(mac.bytes(), [0x00, 0x1c, 0x42, 0xb4, 0x6e, 0x1d]);
    }

    #[test]
    fn mac_address_rejects_wrong_part_count() {
        assert!("00:1c:42".parse::<MacAddress>().is_err());
    }
}
