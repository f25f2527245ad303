#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("packet is too short to contain an IP header")]
    Truncated,
    #[error("IP version nibble is neither 4 nor 6: {0:#03x}")]
    UnknownVersion(u8),
    #[error("no route or peer matches destination {0}")]
    NoMatch(std::net::IpAddr),
}
