#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Handshake(#[from] stp_handshake::HandshakeError),
    #[error(transparent)]
    Record(#[from] stp_record::RecordError),
    #[error(transparent)]
    Rekey(#[from] stp_rekey::RekeyError),
    #[error(transparent)]
    Route(#[from] stp_routing::RouteError),
    #[error(transparent)]
    Dataplane(#[from] stp_dataplane::DataplaneError),
    #[error(transparent)]
    Transport(#[from] std::io::Error),
    #[error(transparent)]
    Wire(#[from] stp_wire::WireError),
    #[error("rekey did not complete within the {0:?} grace window")]
    RekeyGraceExpired(std::time::Duration),
    #[error("connection is closed")]
    Closed,
}
