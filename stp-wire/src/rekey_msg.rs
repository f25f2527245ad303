use byteorder::{BigEndian, ByteOrder};

use crate::WireError;

const KIND_REQUEST: u8 = 1;
const KIND_RESPONSE: u8 = 2;

/// `REKEY` frame payload sent by the initiator: `{ kind = REQUEST, E', nonce, epoch_target }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RekeyRequest {
    pub ephemeral_public: [u8; 32],
    pub nonce: [u8; 16],
    pub epoch_target: u32,
}

/// `REKEY` frame payload sent by the responder: `{ kind = RESPONSE, E_r', nonce_r }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RekeyResponse {
    pub ephemeral_public: [u8; 32],
    pub nonce: [u8; 16],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RekeyWireMessage {
    Request(RekeyRequest),
    Response(RekeyResponse),
}

impl RekeyWireMessage {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RekeyWireMessage::Request(req) => {
                let mut out = Vec::with_capacity(1 + 32 + 16 + 4);
                out.push(KIND_REQUEST);
                out.extend_from_slice(&req.ephemeral_public);
                out.extend_from_slice(&req.nonce);
                let mut epoch = [0u8; 4];
                BigEndian::write_u32(&mut epoch, req.epoch_target);
                out.extend_from_slice(&epoch);
                out
            }
            RekeyWireMessage::Response(resp) => {
                let mut out = Vec::with_capacity(1 + 32 + 16);
                out.push(KIND_RESPONSE);
                out.extend_from_slice(&resp.ephemeral_public);
                out.extend_from_slice(&resp.nonce);
                out
            }
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.is_empty() {
            return Err(WireError::Truncated);
        }
        match buf[0] {
            KIND_REQUEST => {
                if buf.len() < 1 + 32 + 16 + 4 {
                    return Err(WireError::Truncated);
                }
                let mut ephemeral_public = [0u8; 32];
                ephemeral_public.copy_from_slice(&buf[1..33]);
                let mut nonce = [0u8; 16];
                nonce.copy_from_slice(&buf[33..49]);
                let epoch_target = BigEndian::read_u32(&buf[49..53]);
                Ok(RekeyWireMessage::Request(RekeyRequest { ephemeral_public, nonce, epoch_target }))
            }
            KIND_RESPONSE => {
                if buf.len() < 1 + 32 + 16 {
                    return Err(WireError::Truncated);
                }
                let mut ephemeral_public = [0u8; 32];
                ephemeral_public.copy_from_slice(&buf[1..33]);
                let mut nonce = [0u8; 16];
                nonce.copy_from_slice(&buf[33..49]);
                Ok(RekeyWireMessage::Response(RekeyResponse { ephemeral_public, nonce }))
            }
            other => Err(WireError::InvalidRekeyKind(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trip() {
        let msg = RekeyWireMessage::Request(RekeyRequest {
            ephemeral_public: [1; 32],
            nonce: [2; 16],
            epoch_target: 7,
        });
        assert_eq!(RekeyWireMessage::decode(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn response_round_trip() {
        let msg = RekeyWireMessage::Response(RekeyResponse { ephemeral_public: [3; 32], nonce: [4; 16] });
        assert_eq!(RekeyWireMessage::decode(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn unknown_kind_rejected() {
        assert_eq!(RekeyWireMessage::decode(&[9]), Err(WireError::InvalidRekeyKind(9)));
    }
}
