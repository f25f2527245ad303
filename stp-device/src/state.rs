use std::net::SocketAddr;

use serde::Serialize;

use stp_routing::Peer;

use crate::phase::Phase;

/// A point-in-time view of one peer's statistics (§3), computed under a
/// read lock rather than stored as a live reference — this is the core's
/// only concession to an excluded management/HTTP surface: it hands back
/// data, never behavior.
#[derive(Debug, Clone, Serialize)]
pub struct PeerStats {
    pub name: String,
    pub endpoint: Option<SocketAddr>,
    pub last_handshake: i64,
    pub last_send: i64,
    pub last_receive: i64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub rekey_epoch: u32,
}

impl From<&Peer> for PeerStats {
    fn from(peer: &Peer) -> Self {
        PeerStats {
            name: peer.name.clone(),
            endpoint: peer.endpoint,
            last_handshake: peer.last_handshake(),
            last_send: peer.last_send(),
            last_receive: peer.last_receive(),
            messages_sent: peer.messages_sent(),
            messages_received: peer.messages_received(),
            rekey_epoch: peer.rekey_epoch(),
        }
    }
}

/// Snapshot of a [`crate::Device`], per the "runtime reflection" redesign
/// note: a plain, serializable struct computed under a read lock instead of
/// exposing live internal state.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceState {
    pub phase: PhaseSnapshot,
    pub session_epoch: u32,
    pub send_counter: u64,
    pub peers: Vec<PeerStats>,
}

/// A `Serialize`-able mirror of [`Phase`] (`Phase` itself stays a plain enum
/// with no serde dependency, since it's only ever compared, not shipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseSnapshot {
    Init,
    HandshakeInFlight,
    Established,
    Rekeying,
    Closing,
    Closed,
}

impl From<Phase> for PhaseSnapshot {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Init => PhaseSnapshot::Init,
            Phase::HandshakeInFlight => PhaseSnapshot::HandshakeInFlight,
            Phase::Established => PhaseSnapshot::Established,
            Phase::Rekeying => PhaseSnapshot::Rekeying,
            Phase::Closing => PhaseSnapshot::Closing,
            Phase::Closed => PhaseSnapshot::Closed,
        }
    }
}
