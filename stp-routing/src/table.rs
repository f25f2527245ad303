use std::collections::HashMap;
use std::sync::Arc;

use crate::peer::{Peer, PeerSpec};
use crate::router::{RouteEntry, Router};

/// The peer map and route table, replaced together under a single write
/// lock so a lookup never observes one updated without the other (I5).
pub struct PeerSet {
    peers: HashMap<String, Arc<Peer>>,
    router: Router,
}

impl PeerSet {
    pub fn empty() -> Self {
        PeerSet { peers: HashMap::new(), router: Router::new(Vec::new()) }
    }

    /// Build a fresh peer set from config, carrying statistics forward for
    /// any peer name that also existed in `previous` (P9). Peers absent from
    /// `specs` are dropped; peers new to `specs` start at zero counters.
    pub fn build(specs: Vec<PeerSpec>, routes: Vec<RouteEntry>, previous: &PeerSet) -> Self {
        let peers = specs
            .into_iter()
            .map(|spec| {
                let name = spec.name.clone();
                let peer = Peer::new(spec);
                if let Some(old) = previous.peers.get(&name) {
                    peer.adopt_stats(old);
                }
                (name, Arc::new(peer))
            })
            .collect();
        PeerSet { peers, router: Router::new(routes) }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Peer>> {
        self.peers.get(name).cloned()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Peer>> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> PeerSpec {
        PeerSpec { name: name.to_string(), endpoint: None, allowed_prefixes: vec![] }
    }

    #[test]
    fn peer_hot_reload_preserves_stats_for_surviving_peers() {
        let initial = PeerSet::build(vec![spec("a"), spec("b")], vec![], &PeerSet::empty());
        initial.get("a").unwrap().record_send(500);
        initial.get("a").unwrap().record_send(600);

        let reloaded = PeerSet::build(vec![spec("a"), spec("c")], vec![], &initial);

        assert!(reloaded.get("a").is_some());
        assert_eq!(reloaded.get("a").unwrap().messages_sent(), 2);
        assert_eq!(reloaded.get("a").unwrap().last_send(), 600);
        assert!(reloaded.get("b").is_none());
        assert!(reloaded.get("c").is_some());
        assert_eq!(reloaded.get("c").unwrap().messages_sent(), 0);
    }
}
