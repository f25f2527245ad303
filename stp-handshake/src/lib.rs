//! The STP handshake engine (§4.2): a two-message, PSK-authenticated X25519
//! key agreement producing a [`stp_crypto::SessionSecrets`] and
//! [`stp_crypto::TransportParameters`] pair.
//!
//! The pure state machine (`Initiator`/`Responder`) has no I/O; [`io`]
//! layers an async read/write adapter on top for callers that already have
//! a connected byte stream.

mod error;
mod io;
mod machine;

pub use error::HandshakeError;
pub use io::{run_initiator, run_responder, HANDSHAKE_IO_TIMEOUT};
pub use machine::{Initiator, Responder};

/// INITIATOR or RESPONDER, as named in §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}
