#[derive(Debug, thiserror::Error)]
pub enum RekeyError {
    #[error(transparent)]
    Crypto(#[from] stp_crypto::CryptoError),
    #[error(transparent)]
    Wire(#[from] stp_wire::WireError),
    #[error("pending rekey context is older than the rekey interval and must be re-initiated")]
    Stale,
}
