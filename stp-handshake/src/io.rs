use std::time::Duration;

use rand_core::{CryptoRng, RngCore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use stp_crypto::{PreSharedKey, SessionSecrets, TransportParameters};
use stp_wire::{Message1, Message2};

use crate::error::HandshakeError;
use crate::machine::{Initiator, Responder};

/// I/O deadline for the whole handshake exchange (§5).
pub const HANDSHAKE_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the initiator side of the handshake over an already-connected
/// stream: write message 1, read message 2, finalize.
pub async fn run_initiator<S, R>(
    stream: &mut S,
    psk: PreSharedKey,
    rng: &mut R,
) -> Result<(SessionSecrets, TransportParameters), HandshakeError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    R: RngCore + CryptoRng,
{
    tokio::time::timeout(HANDSHAKE_IO_TIMEOUT, async {
        let (initiator, msg1) = Initiator::new(psk, rng);
        stream.write_all(&msg1.encode()).await?;

        let mut buf = [0u8; Message2::ENCODED_LEN];
        stream.read_exact(&mut buf).await?;
        let msg2 = Message2::decode(&buf)?;

        initiator.finalize(&msg2)
    })
    .await
    .unwrap_or(Err(HandshakeError::Timeout(HANDSHAKE_IO_TIMEOUT)))
}

/// Run the responder side of the handshake over an already-connected
/// stream: read message 1, write message 2.
pub async fn run_responder<S, R>(
    stream: &mut S,
    psk: PreSharedKey,
    transport_params: TransportParameters,
    rng: &mut R,
) -> Result<SessionSecrets, HandshakeError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    R: RngCore + CryptoRng,
{
    tokio::time::timeout(HANDSHAKE_IO_TIMEOUT, async {
        let mut buf = [0u8; Message1::ENCODED_LEN];
        stream.read_exact(&mut buf).await?;
        let msg1 = Message1::decode(&buf)?;

        let responder = Responder::new(psk, transport_params);
        let (msg2, secrets) = responder.respond(&msg1, rng)?;
        stream.write_all(&msg2.encode()).await?;

        Ok(secrets)
    })
    .await
    .unwrap_or(Err(HandshakeError::Timeout(HANDSHAKE_IO_TIMEOUT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[tokio::test]
    async fn handshake_over_duplex_stream() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let psk = || PreSharedKey::derive("correct horse battery staple").unwrap();

        let responder = tokio::spawn(async move {
            run_responder(&mut b, psk(), TransportParameters::default(), &mut OsRng).await
        });
        let (i_secrets, params) = run_initiator(&mut a, psk(), &mut OsRng).await.unwrap();
        let r_secrets = responder.await.unwrap().unwrap();

        assert_eq!(i_secrets.send_key, r_secrets.recv_key);
        assert_eq!(params, TransportParameters::default());
    }
}
