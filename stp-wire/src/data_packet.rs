use crate::WireError;

/// Marker byte identifying a DATA packet inside a sealed DATA frame.
const PACKET_TYPE_DATA: u8 = 0x01;

/// The packet carried inside a sealed DATA frame (§4.8):
///
/// ```text
/// type       (1 B)   // always PACKET_TYPE_DATA
/// flags      (1 B)   // reserved, always 0 for now
/// peer_len   (1 B)
/// peer_name  (peer_len B, UTF-8)
/// payload    (remainder)
/// ```
///
/// A `None` peer name (wire `peer_len == 0`) means "dispatch by IP
/// destination" — the normal case for routed tunnel traffic. A `Some` name
/// bypasses route lookup, used for traffic addressed to a named peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub peer_name: Option<String>,
    pub payload: Vec<u8>,
}

impl DataPacket {
    pub fn encode(&self) -> Vec<u8> {
        let peer_bytes = self.peer_name.as_deref().unwrap_or("").as_bytes();
        let mut out = Vec::with_capacity(3 + peer_bytes.len() + self.payload.len());
        out.push(PACKET_TYPE_DATA);
        out.push(0); // flags: reserved
        out.push(peer_bytes.len() as u8);
        out.extend_from_slice(peer_bytes);
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < 3 {
            return Err(WireError::Truncated);
        }
        // type and flags bytes are not validated further: the record layer
        // already demultiplexed on the frame's flag byte before handing us
        // a DATA payload, and flags here are reserved for future use.
        let peer_len = buf[2] as usize;
        let rest = &buf[3..];
        if rest.len() < peer_len {
            return Err(WireError::Truncated);
        }
        let (name_bytes, payload) = rest.split_at(peer_len);
        let peer_name = if peer_len == 0 {
            None
        } else {
            Some(std::str::from_utf8(name_bytes).map_err(|_| WireError::InvalidPeerName)?.to_owned())
        };
        Ok(DataPacket { peer_name, payload: payload.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_peer_name() {
        let pkt = DataPacket { peer_name: Some("alice".into()), payload: vec![1, 2, 3] };
        let encoded = pkt.encode();
        assert_eq!(DataPacket::decode(&encoded).unwrap(), pkt);
    }

    #[test]
    fn round_trip_without_peer_name() {
        let pkt = DataPacket { peer_name: None, payload: vec![9; 64] };
        let encoded = pkt.encode();
        assert_eq!(encoded[2], 0);
        assert_eq!(DataPacket::decode(&encoded).unwrap(), pkt);
    }

    #[test]
    fn decode_rejects_truncated_peer_name() {
        let buf = [PACKET_TYPE_DATA, 0, 5, b'a', b'b'];
        assert_eq!(DataPacket::decode(&buf), Err(WireError::Truncated));
    }

    #[test]
    fn decode_rejects_invalid_utf8_peer_name() {
        let buf = [PACKET_TYPE_DATA, 0, 2, 0xff, 0xfe];
        assert_eq!(DataPacket::decode(&buf), Err(WireError::InvalidPeerName));
    }
}
