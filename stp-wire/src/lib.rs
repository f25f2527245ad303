//! Wire formats for STP: the frame flag byte, the DATA packet layout that
//! lives inside a sealed DATA frame, and the plaintext shapes of the
//! handshake and rekey messages. Nothing in this crate touches a socket or
//! an AEAD — it only encodes and decodes byte layouts.

mod data_packet;
mod flags;
mod handshake_msg;
mod rekey_msg;

pub use data_packet::DataPacket;
pub use flags::FrameFlag;
pub use handshake_msg::{Message1, Message2, TransportParametersWire};
pub use rekey_msg::{RekeyRequest, RekeyResponse, RekeyWireMessage};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("buffer is too short to contain the declared field")]
    Truncated,
    #[error("frame flags byte has zero or more than one bit set: {0:#04x}")]
    InvalidFlags(u8),
    #[error("peer name is not valid UTF-8")]
    InvalidPeerName,
    #[error("rekey message kind byte is unrecognized: {0}")]
    InvalidRekeyKind(u8),
    #[error("declared length exceeds the remaining buffer")]
    LengthOverflow,
}
