use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};

use ipnet::IpNet;

/// Static configuration for a peer, as supplied at config load or reload —
/// no statistics, just the identity and routing surface (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSpec {
    pub name: String,
    pub endpoint: Option<SocketAddr>,
    pub allowed_prefixes: Vec<IpNet>,
}

/// A peer known to the device, plus the live statistics updated by the
/// receive loop and outbound pump (§3, §5). Counters are independent atomics
/// rather than a peer-wide lock, matching the all-atomics statistics block
/// used for per-peer bookkeeping in this codebase's dataplane-adjacent
/// neighbors — the two loops touch disjoint fields and must never contend.
pub struct Peer {
    pub name: String,
    pub endpoint: Option<SocketAddr>,
    pub allowed_prefixes: Vec<IpNet>,

    last_handshake_millis: AtomicI64,
    last_send_millis: AtomicI64,
    last_receive_millis: AtomicI64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    rekey_epoch: AtomicU32,
}

impl Peer {
    pub fn new(spec: PeerSpec) -> Self {
        Peer {
            name: spec.name,
            endpoint: spec.endpoint,
            allowed_prefixes: spec.allowed_prefixes,
            last_handshake_millis: AtomicI64::new(0),
            last_send_millis: AtomicI64::new(0),
            last_receive_millis: AtomicI64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            rekey_epoch: AtomicU32::new(0),
        }
    }

    /// (I3) Every sent frame advances `last_send`. Called by the outbound
    /// pump only.
    pub fn record_send(&self, now_millis: i64) {
        self.last_send_millis.store(now_millis, Ordering::Relaxed);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// (I3) Every accepted inbound frame advances `last_receive`. Called by
    /// the receive loop only.
    pub fn record_receive(&self, now_millis: i64) {
        self.last_receive_millis.store(now_millis, Ordering::Relaxed);
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handshake(&self, now_millis: i64) {
        self.last_handshake_millis.store(now_millis, Ordering::Relaxed);
    }

    pub fn set_rekey_epoch(&self, epoch: u32) {
        self.rekey_epoch.store(epoch, Ordering::Relaxed);
    }

    /// Copy every statistic from `old` verbatim (P9: a peer that survives a
    /// config reload keeps its counters, even though it's a freshly
    /// constructed `Peer` with possibly different config fields).
    pub fn adopt_stats(&self, old: &Peer) {
        self.last_handshake_millis.store(old.last_handshake(), Ordering::Relaxed);
        self.last_send_millis.store(old.last_send(), Ordering::Relaxed);
        self.last_receive_millis.store(old.last_receive(), Ordering::Relaxed);
        self.messages_sent.store(old.messages_sent(), Ordering::Relaxed);
        self.messages_received.store(old.messages_received(), Ordering::Relaxed);
        self.rekey_epoch.store(old.rekey_epoch(), Ordering::Relaxed);
    }

    pub fn last_handshake(&self) -> i64 {
        self.last_handshake_millis.load(Ordering::Relaxed)
    }

    pub fn last_send(&self) -> i64 {
        self.last_send_millis.load(Ordering::Relaxed)
    }

    pub fn last_receive(&self) -> i64 {
        self.last_receive_millis.load(Ordering::Relaxed)
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn rekey_epoch(&self) -> u32 {
        self.rekey_epoch.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> PeerSpec {
        PeerSpec { name: name.to_string(), endpoint: None, allowed_prefixes: vec![] }
    }

    #[test]
    fn counters_start_at_zero() {
        let peer = Peer::new(spec("a"));
        assert_eq!(peer.messages_sent(), 0);
        assert_eq!(peer.messages_received(), 0);
        assert_eq!(peer.last_send(), 0);
    }

    #[test]
    fn record_send_advances_counter_and_timestamp() {
        let peer = Peer::new(spec("a"));
        peer.record_send(1000);
        peer.record_send(2000);
        assert_eq!(peer.messages_sent(), 2);
        assert_eq!(peer.last_send(), 2000);
    }
}
