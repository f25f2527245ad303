#[derive(Debug, thiserror::Error)]
pub enum DataplaneError {
    #[error("dataplane is closed")]
    Closed,
    #[error("no route or peer named {0:?} to deliver to")]
    UnknownPeer(Option<String>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
