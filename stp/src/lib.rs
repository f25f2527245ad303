//! Secure Tunneling Protocol.
//!
//! A mutual-auth handshake establishes a session; an obfuscated, padded AEAD
//! record layer carries traffic under it; an in-band rekey exchange rotates
//! keys without a new handshake; a peer/route table decides where a payload
//! goes; a [`dataplane::Dataplane`] decides how it enters and leaves the
//! local machine. [`Device`] wires all of that into one connection's
//! lifecycle — that's the type most callers want.
//!
//! The pieces are also usable on their own, each under its own module here,
//! for callers building something other than the full device loop.

pub mod crypto {
    pub use stp_crypto::*;
}

pub mod wire {
    pub use stp_wire::*;
}

pub mod handshake {
    pub use stp_handshake::*;
}

pub mod record {
    pub use stp_record::*;
}

pub mod rekey {
    pub use stp_rekey::*;
}

pub mod routing {
    pub use stp_routing::*;
}

pub mod dataplane {
    pub use stp_dataplane::*;
}

pub use stp_device::{
    ConfigError, Device, DeviceConfig, DeviceError, DeviceState, Mode, PeerConfig, PeerStats, Phase,
    PhaseSnapshot, TunnelConfig, TunnelType, ValidatedConfig,
};
