use std::net::IpAddr;

use ipnet::IpNet;

use crate::RouteError;

/// `(prefix, peer_name)`, built from peer configuration (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub prefix: IpNet,
    pub peer_name: String,
}

/// Longest-prefix-match route table. Entries are kept sorted by descending
/// prefix length at construction so lookup is a first-match linear scan.
pub struct Router {
    entries: Vec<RouteEntry>,
}

impl Router {
    pub fn new(mut entries: Vec<RouteEntry>) -> Self {
        entries.sort_by(|a, b| b.prefix.prefix_len().cmp(&a.prefix.prefix_len()));
        Router { entries }
    }

    /// Find the peer whose route covers `destination` with the longest
    /// matching prefix, or [`RouteError::NoMatch`] if none does.
    pub fn lookup(&self, destination: IpAddr) -> Result<&str, RouteError> {
        self.entries
            .iter()
            .find(|entry| entry.prefix.contains(&destination))
            .map(|entry| entry.peer_name.as_str())
            .ok_or(RouteError::NoMatch(destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(prefix: &str, peer: &str) -> RouteEntry {
        RouteEntry { prefix: prefix.parse().unwrap(), peer_name: peer.to_string() }
    }

    #[test]
    fn longest_prefix_routing() {
        let router = Router::new(vec![entry("10.0.0.0/8", "a"), entry("10.1.2.0/24", "b")]);
        assert_eq!(router.lookup("10.1.2.5".parse().unwrap()).unwrap(), "b");
        assert_eq!(router.lookup("10.2.3.4".parse().unwrap()).unwrap(), "a");
    }

    #[test]
    fn no_match_is_an_error() {
        let router = Router::new(vec![entry("10.0.0.0/8", "a")]);
        let dest: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(router.lookup(dest), Err(RouteError::NoMatch(dest)));
    }

    #[test]
    fn order_of_construction_does_not_matter() {
        let a = Router::new(vec![entry("10.1.2.0/24", "b"), entry("10.0.0.0/8", "a")]);
        let b = Router::new(vec![entry("10.0.0.0/8", "a"), entry("10.1.2.0/24", "b")]);
        let dest: IpAddr = "10.1.2.5".parse().unwrap();
        assert_eq!(a.lookup(dest).unwrap(), b.lookup(dest).unwrap());
    }
}
