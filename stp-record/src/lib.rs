//! The STP record layer (§4.3): frames a payload into a masked, padded,
//! AEAD-sealed record and back. Nothing here knows about handshakes, peers,
//! or routing — it only turns `(flags, payload)` into bytes and back, given
//! a pair of [`SendState`]/[`RecvState`] derived from session secrets.

mod cipher_state;
mod header;
mod masking;
mod padding;
mod replay;

pub use cipher_state::{RecvState, SendState};
pub use header::{RecordHeader, HEADER_LEN};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record buffer is shorter than its declared length")]
    Truncated,
    #[error("record header has an unrecognized type or version")]
    BadHeader,
    #[error("AEAD authentication failed")]
    Aead,
    #[error("record counter is not greater than the last accepted counter")]
    Replay,
    #[error("declared padding length exceeds the remaining body bytes")]
    BadPadding,
    #[error("decrypted payload length does not match its length prefix")]
    LengthMismatch,
    #[error("payload too large to fit a 16-bit record length")]
    PayloadTooLarge,
    #[error(transparent)]
    Wire(#[from] stp_wire::WireError),
}
