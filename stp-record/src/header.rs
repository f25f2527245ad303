use byteorder::{BigEndian, ByteOrder};

use crate::RecordError;

/// `type = 0x17` mimics a TLS opaque-application record — a cheap nod
/// toward traffic-analysis resistance for middleboxes that sniff the first
/// byte of a TCP stream.
const RECORD_TYPE: u8 = 0x17;
const VERSION_MAJOR: u8 = 0x03;
const VERSION_MINOR: u8 = 0x03;

pub const HEADER_LEN: usize = 5;

/// The 5-byte record header (§4.3), fixed except for `length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub length: u16,
}

impl RecordHeader {
    pub fn encode(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = RECORD_TYPE;
        out[1] = VERSION_MAJOR;
        out[2] = VERSION_MINOR;
        BigEndian::write_u16(&mut out[3..5], self.length);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() < HEADER_LEN {
            return Err(RecordError::Truncated);
        }
        if buf[0] != RECORD_TYPE || buf[1] != VERSION_MAJOR || buf[2] != VERSION_MINOR {
            return Err(RecordError::BadHeader);
        }
        Ok(RecordHeader { length: BigEndian::read_u16(&buf[3..5]) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let h = RecordHeader { length: 1234 };
        assert_eq!(RecordHeader::decode(&h.encode()).unwrap(), h);
    }

    #[test]
    fn rejects_wrong_type() {
        let mut bytes = RecordHeader { length: 1 }.encode();
        bytes[0] = 0x16;
        assert!(matches!(RecordHeader::decode(&bytes), Err(RecordError::BadHeader)));
    }
}
