#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("crypto error during handshake: {0}")]
    Crypto(#[from] stp_crypto::CryptoError),
    #[error("wire decoding error during handshake: {0}")]
    Wire(#[from] stp_wire::WireError),
    #[error("MAC1 did not verify: PSK mismatch or corrupted message 1")]
    Mac1Mismatch,
    #[error("MAC2 did not verify: PSK mismatch or corrupted message 2")]
    Mac2Mismatch,
    #[error("responder's transport parameters are outside the accepted range")]
    InvalidTransportParameters,
    #[error("I/O error during handshake: {0}")]
    Io(#[from] std::io::Error),
    #[error("handshake did not complete within the {0:?} deadline")]
    Timeout(std::time::Duration),
}
