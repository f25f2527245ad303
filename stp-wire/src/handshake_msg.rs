use byteorder::{BigEndian, ByteOrder};

use crate::WireError;

/// Authenticated, unencrypted transport parameters block carried in
/// message 2 (§4.2). The responder is authoritative for these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportParametersWire {
    pub keepalive_ms: u32,
    pub max_padding: u8,
}

impl TransportParametersWire {
    pub const ENCODED_LEN: usize = 5;

    pub fn encode(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, self.keepalive_ms);
        out.extend_from_slice(&buf);
        out.push(self.max_padding);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < Self::ENCODED_LEN {
            return Err(WireError::Truncated);
        }
        Ok(TransportParametersWire {
            keepalive_ms: BigEndian::read_u32(&buf[0..4]),
            max_padding: buf[4],
        })
    }
}

/// Handshake message 1 (INITIATOR -> RESPONDER): `E_i || N_i || MAC1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message1 {
    pub e_i: [u8; 32],
    pub n_i: [u8; 16],
    pub mac1: [u8; 16],
}

impl Message1 {
    pub const ENCODED_LEN: usize = 32 + 16 + 16;

    /// Everything up to (but not including) the MAC — the bytes MAC1 is
    /// computed over.
    pub fn signed_prefix(e_i: &[u8; 32], n_i: &[u8; 16]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(48);
        buf.extend_from_slice(e_i);
        buf.extend_from_slice(n_i);
        buf
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Self::signed_prefix(&self.e_i, &self.n_i);
        out.extend_from_slice(&self.mac1);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < Self::ENCODED_LEN {
            return Err(WireError::Truncated);
        }
        let mut e_i = [0u8; 32];
        let mut n_i = [0u8; 16];
        let mut mac1 = [0u8; 16];
        e_i.copy_from_slice(&buf[0..32]);
        n_i.copy_from_slice(&buf[32..48]);
        mac1.copy_from_slice(&buf[48..64]);
        Ok(Message1 { e_i, n_i, mac1 })
    }
}

/// Handshake message 2 (RESPONDER -> INITIATOR):
/// `E_r || N_r || TransportParameters || MAC2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message2 {
    pub e_r: [u8; 32],
    pub n_r: [u8; 16],
    pub params: TransportParametersWire,
    pub mac2: [u8; 16],
}

impl Message2 {
    pub const ENCODED_LEN: usize = 32 + 16 + TransportParametersWire::ENCODED_LEN + 16;

    /// Everything up to (but not including) MAC2 — note MAC2's input per
    /// §4.2 is `E_i || E_r || N_i || N_r || params`, not just this message's
    /// own bytes, so callers build the MAC2 input separately; this is only
    /// the wire encoding of message 2 itself.
    pub fn signed_suffix(e_r: &[u8; 32], n_r: &[u8; 16], params: &TransportParametersWire) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32 + 16 + TransportParametersWire::ENCODED_LEN);
        buf.extend_from_slice(e_r);
        buf.extend_from_slice(n_r);
        params.encode(&mut buf);
        buf
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Self::signed_suffix(&self.e_r, &self.n_r, &self.params);
        out.extend_from_slice(&self.mac2);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < Self::ENCODED_LEN {
            return Err(WireError::Truncated);
        }
        let mut e_r = [0u8; 32];
        let mut n_r = [0u8; 16];
        e_r.copy_from_slice(&buf[0..32]);
        n_r.copy_from_slice(&buf[32..48]);
        let params = TransportParametersWire::decode(&buf[48..48 + TransportParametersWire::ENCODED_LEN])?;
        let mac_start = 48 + TransportParametersWire::ENCODED_LEN;
        let mut mac2 = [0u8; 16];
        mac2.copy_from_slice(&buf[mac_start..mac_start + 16]);
        Ok(Message2 { e_r, n_r, params, mac2 })
    }
}
