/// The connection lifecycle (§4.7): `Init -> HandshakeInFlight -> Established
/// -> (Rekeying | Closing) -> Closed`. `Rekeying` always returns to
/// `Established`; only `Closing` is terminal-bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    HandshakeInFlight,
    Established,
    Rekeying,
    Closing,
    Closed,
}

impl Phase {
    pub fn is_active(self) -> bool {
        !matches!(self, Phase::Closing | Phase::Closed)
    }
}
