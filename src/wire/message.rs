use crate::errors::CodecError;
use crate::wire::constants::{option, BOOT_REPLY};
use crate::wire::header::Header;
use crate::wire::options::Options;
use crate::wire::types::FixedV4;

/// A fully decoded DHCP datagram: the fixed header plus its option stream.
///
/// After [`Message::decode`], `header.op` carries the DHCP message type (not
/// the raw BOOTP opcode) and `header.ciaddr` carries the client's requested
/// IP when option 50 was present — both overlaid from options onto the
/// header fields they logically belong with, per the wire codec's contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub options: Options,
}

impl Message {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut header = Header::decode(bytes)?;
        let options = Options::decode(&bytes[crate::wire::constants::HEADER_LEN..]);

        if let Some(message_type) = options.get_byte(option::MESSAGE_TYPE) {
            header.op = message_type;
        }
        if let Some(requested) = options.get_v4(option::REQUESTED_IP) {
            header.ciaddr = FixedV4::from_bytes(requested);
        }

        Ok(Message { header, options })
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(crate::wire::constants::HEADER_LEN + 64);
        self.header.encode(&mut buf);
        buf.extend(self.options.encode()?);
        Ok(buf)
    }

    /// The DHCP message type this message carries (post-overlay `header.op`).
    pub fn message_type(&self) -> u8 {
        self.header.op
    }

    /// Builds an empty reply header shared by OFFER/ACK/NAK, per §4.3's
    /// reply assembly rules: op=reply, htype/hlen constant, hops=0, xid
    /// copied from the request, chaddr copied from the request.
    pub fn reply_header(&self) -> Header {
        Header {
            op: BOOT_REPLY,
            hops: 0,
            xid: self.header.xid,
            secs: 0,
            flags: self.header.flags,
            ciaddr: FixedV4::UNSPECIFIED,
            yiaddr: FixedV4::UNSPECIFIED,
            siaddr: FixedV4::UNSPECIFIED,
            giaddr: self.header.giaddr,
            chaddr: self.header.chaddr,
            sname: [0u8; 64],
            file: [0u8; 128],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::constants::{option, DHCP_DISCOVER, HEADER_LEN};

    fn encoded_discover() -> Vec<u8> {
        let header = Header {
            op: 1, // BOOTREQUEST; overlaid to DHCP_DISCOVER by option 53
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
        };
        let mut buf = Vec::new();
        header.encode(&mut buf);
        let mut options = Options::new();
        options.insert(option::MESSAGE_TYPE, vec![DHCP_DISCOVER]);
        buf.extend(options.encode().unwrap());
        buf
    }

    #[test]
    fn decode_overlays_message_type_onto_header_op() {
        let message = Message::decode(&encoded_discover()).unwrap();
        assert_eq!(message.message_type(), DHCP_DISCOVER);
        assert_eq!(message.header.op, DHCP_DISCOVER);
    }

    #[test]
    fn decode_overlays_requested_ip_onto_ciaddr() {
        let mut bytes = encoded_discover();
        // Replace the trailing sentinel with a requested-IP option then a new sentinel.
        bytes.truncate(bytes.len() - 1);
        let mut options = Options::new();
        options.insert(option::MESSAGE_TYPE, vec![DHCP_DISCOVER]);
        options.insert(option::REQUESTED_IP, vec![10, 0, 0, 11]);
        let mut buf = bytes[..HEADER_LEN].to_vec();
        buf.extend(options.encode().unwrap());

        let message = Message::decode(&buf).unwrap();
        assert_eq!(message.header.ciaddr.bytes(), [10, 0, 0, 11]);
    }

    #[test]
    fn encode_roundtrips() {
        let message = Message::decode(&encoded_discover()).unwrap();
        let encoded = message.encode().unwrap();
        let decoded = Message::decode(&encoded).unwrap();
        assert_eq!(decoded, message);
    }
}
