use crate::errors::CodecError;
use crate::wire::constants::{HEADER_LEN, MAGIC_COOKIE};
use crate::wire::types::{FixedV4, MacAddress};

/// The fixed 240-byte header that precedes the option stream in every
/// BOOTP/DHCP datagram.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub op: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: FixedV4,
    pub yiaddr: FixedV4,
    pub siaddr: FixedV4,
    pub giaddr: FixedV4,
    pub chaddr: MacAddress,
    pub sname: [u8; 64],
    pub file: [u8; 128],
}

impl Header {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::ShortHeader {
                expected: HEADER_LEN,
                got: bytes.len(),
            });
        }

        let op = bytes[0];
        let htype = bytes[1];
        let hlen = bytes[2];
        let hops = bytes[3];
        let xid = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let secs = u16::from_be_bytes(bytes[8..10].try_into().unwrap());
        let flags = u16::from_be_bytes(bytes[10..12].try_into().unwrap());
        let ciaddr = FixedV4::from_bytes(bytes[12..16].try_into().unwrap());
        let yiaddr = FixedV4::from_bytes(bytes[16..20].try_into().unwrap());
        let siaddr = FixedV4::from_bytes(bytes[20..24].try_into().unwrap());
        let giaddr = FixedV4::from_bytes(bytes[24..28].try_into().unwrap());
        let chaddr = MacAddress::from_bytes(bytes[28..34].try_into().unwrap());
        // bytes[34..44] is chaddr padding, discarded
        let mut sname = [0u8; 64];
        sname.copy_from_slice(&bytes[44..108]);
        let mut file = [0u8; 128];
        file.copy_from_slice(&bytes[108..236]);
        let magic: [u8; 4] = bytes[236..240].try_into().unwrap();

        if htype != 1 {
            return Err(CodecError::UnsupportedHType(htype));
        }
        if hlen != 6 {
            return Err(CodecError::UnsupportedHLen(hlen));
        }
        if magic != MAGIC_COOKIE {
            return Err(CodecError::BadMagic);
        }

        Ok(Header {
            op,
            hops,
            xid,
            secs,
            flags,
            ciaddr,
            yiaddr,
            siaddr,
            giaddr,
            chaddr,
            sname,
            file,
        })
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.op);
        buf.push(1); // htype: always Ethernet
        buf.push(6); // hlen: always 6
        buf.push(self.hops);
        buf.extend_from_slice(&self.xid.to_be_bytes());
        buf.extend_from_slice(&self.secs.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&self.ciaddr.bytes());
        buf.extend_from_slice(&self.yiaddr.bytes());
        buf.extend_from_slice(&self.siaddr.bytes());
        buf.extend_from_slice(&self.giaddr.bytes());
        buf.extend_from_slice(&self.chaddr.bytes());
        buf.extend_from_slice(&[0u8; 10]);
        buf.extend_from_slice(&self.sname);
        buf.extend_from_slice(&self.file);
        buf.extend_from_slice(&MAGIC_COOKIE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            op: 1,
            hops: 0,
            xid: 0xed5c4610,
            secs: 0,
            flags: 0,
            ciaddr: FixedV4::UNSPECIFIED,
            yiaddr: FixedV4::UNSPECIFIED,
            siaddr: FixedV4::UNSPECIFIED,
            giaddr: FixedV4::UNSPECIFIED,
            chaddr: "00:1c:42:b4:6e:1d".parse().unwrap(),
            sname: [0u8; 64],
            file: [0u8; 128],
        }
    }

    #[test]
    fn roundtrips() {
        let header = sample();
        let mut buf = Vec::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        let decoded = Header::decode(&buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            Header::decode(&[0u8; 10]),
            Err(CodecError::ShortHeader { expected: HEADER_LEN, got: 10 })
        ));
    }

    #[test]
    fn rejects_bad_magic() {
        let header = sample();
        let mut buf = Vec::new();
        header.encode(&mut buf);
        let last = buf.len() - 1;
        buf[last] ^= 0xff;
        assert!(matches!(Header::decode(&buf), Err(CodecError::BadMagic)));
    }

    #[test]
    fn rejects_wrong_htype_and_hlen() {
        let header = sample();
        let mut buf = Vec::new();
        header.encode(&mut buf);
        buf[1] = 6;
        assert!(matches!(Header::decode(&buf), Err(CodecError::UnsupportedHType(6))));

        let mut buf = Vec::new();
        header.encode(&mut buf);
        buf[2] = 4;
        assert!(matches!(Header::decode(&buf), Err(CodecError::UnsupportedHLen(4))));
    }
}
