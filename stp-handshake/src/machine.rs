use rand_core::{CryptoRng, RngCore};

use stp_crypto::{
    constant_time_eq, derive_session_secrets, hmac_sha256, EphemeralPrivateKey, PreSharedKey,
    PublicKey, SessionSecrets, TransportParameters,
};
use stp_wire::{Message1, Message2, TransportParametersWire};

use crate::error::HandshakeError;

const MAC1_LABEL: &[u8] = b"stp/mac1";
const MAC2_LABEL: &[u8] = b"stp/mac2";
const ROOT_INFO: &[u8] = b"stp/root";

fn random_nonce16<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; 16] {
    let mut n = [0u8; 16];
    rng.fill_bytes(&mut n);
    n
}

fn mac1(psk: &PreSharedKey, e_i: &[u8; 32], n_i: &[u8; 16]) -> [u8; 16] {
    let mut input = Vec::with_capacity(MAC1_LABEL.len() + 48);
    input.extend_from_slice(MAC1_LABEL);
    input.extend_from_slice(&Message1::signed_prefix(e_i, n_i));
    let mut out = [0u8; 16];
    hmac_sha256(psk.as_bytes(), &input, &mut out);
    out
}

fn mac2(
    psk: &PreSharedKey,
    e_i: &[u8; 32],
    e_r: &[u8; 32],
    n_i: &[u8; 16],
    n_r: &[u8; 16],
    params: &TransportParametersWire,
) -> [u8; 16] {
    let mut input = Vec::with_capacity(MAC2_LABEL.len() + 32 + 16 + 16 + 16 + 5);
    input.extend_from_slice(MAC2_LABEL);
    input.extend_from_slice(e_i);
    input.extend_from_slice(e_r);
    input.extend_from_slice(n_i);
    input.extend_from_slice(n_r);
    params.encode(&mut input);
    let mut out = [0u8; 16];
    hmac_sha256(psk.as_bytes(), &input, &mut out);
    out
}

fn validate_params(params: &TransportParametersWire) -> Result<TransportParameters, HandshakeError> {
    let keepalive = std::time::Duration::from_millis(params.keepalive_ms as u64);
    TransportParameters::new(keepalive, params.max_padding)
        .ok_or(HandshakeError::InvalidTransportParameters)
}

/// The initiator side of the handshake (§4.2). Holds its ephemeral secret
/// between [`Initiator::new`] and [`Initiator::finalize`], then drops it.
pub struct Initiator {
    psk: PreSharedKey,
    ephemeral: EphemeralPrivateKey,
    e_i_pub: [u8; 32],
    n_i: [u8; 16],
}

impl Initiator {
    /// Generate message 1 and return it alongside the in-progress state
    /// needed to process the responder's message 2.
    pub fn new<R: RngCore + CryptoRng>(psk: PreSharedKey, rng: &mut R) -> (Self, Message1) {
        let ephemeral = EphemeralPrivateKey::generate(rng);
        let e_i_pub = *ephemeral.public_key().as_bytes();
        let n_i = random_nonce16(rng);
        let mac1 = mac1(&psk, &e_i_pub, &n_i);

        let msg1 = Message1 { e_i: e_i_pub, n_i, mac1 };
        (Self { psk, ephemeral, e_i_pub, n_i }, msg1)
    }

    /// Consume the responder's message 2, completing the handshake.
    pub fn finalize(
        self,
        msg2: &Message2,
    ) -> Result<(SessionSecrets, TransportParameters), HandshakeError> {
        let expected_mac2 = mac2(&self.psk, &self.e_i_pub, &msg2.e_r, &self.n_i, &msg2.n_r, &msg2.params);
        if !constant_time_eq(&expected_mac2, &msg2.mac2) {
            return Err(HandshakeError::Mac2Mismatch);
        }
        let params = validate_params(&msg2.params)?;

        let e_r = PublicKey::from(msg2.e_r);
        let shared = self.ephemeral.diffie_hellman(&e_r);
        let salt = [&self.n_i[..], &msg2.n_r[..]].concat();

        let secrets = derive_session_secrets(&shared, &salt, ROOT_INFO, true, 0)?;
        Ok((secrets, params))
    }
}

/// The responder side of the handshake (§4.2). The responder is
/// authoritative for [`TransportParameters`]: it supplies them, the
/// initiator only validates the ranges.
pub struct Responder {
    psk: PreSharedKey,
    transport_params: TransportParameters,
}

impl Responder {
    pub fn new(psk: PreSharedKey, transport_params: TransportParameters) -> Self {
        Self { psk, transport_params }
    }

    /// Validate the initiator's message 1 and produce message 2 plus the
    /// completed session. Unlike the initiator, the responder has no
    /// further message to wait for — it finishes in one step.
    pub fn respond<R: RngCore + CryptoRng>(
        &self,
        msg1: &Message1,
        rng: &mut R,
    ) -> Result<(Message2, SessionSecrets), HandshakeError> {
        let expected_mac1 = mac1(&self.psk, &msg1.e_i, &msg1.n_i);
        if !constant_time_eq(&expected_mac1, &msg1.mac1) {
            return Err(HandshakeError::Mac1Mismatch);
        }

        let ephemeral = EphemeralPrivateKey::generate(rng);
        let e_r_pub = *ephemeral.public_key().as_bytes();
        let n_r = random_nonce16(rng);
        let params_wire = TransportParametersWire {
            keepalive_ms: self.transport_params.keepalive.as_millis() as u32,
            max_padding: self.transport_params.max_padding,
        };
        let mac2_value = mac2(&self.psk, &msg1.e_i, &e_r_pub, &msg1.n_i, &n_r, &params_wire);

        let e_i = PublicKey::from(msg1.e_i);
        let shared = ephemeral.diffie_hellman(&e_i);
        let salt = [&msg1.n_i[..], &n_r[..]].concat();
        let secrets = derive_session_secrets(&shared, &salt, ROOT_INFO, false, 0)?;

        let msg2 = Message2 { e_r: e_r_pub, n_r, params: params_wire, mac2: mac2_value };
        Ok((msg2, secrets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn psk() -> PreSharedKey {
        PreSharedKey::derive("correct horse battery staple").unwrap()
    }

    #[test]
    fn handshake_agrees_on_keys_both_directions() {
        let mut rng = OsRng;
        let (initiator, msg1) = Initiator::new(psk(), &mut rng);
        let responder = Responder::new(psk(), TransportParameters::default());
        let (msg2, r_secrets) = responder.respond(&msg1, &mut rng).unwrap();
        let (i_secrets, params) = initiator.finalize(&msg2).unwrap();

        assert_eq!(i_secrets.send_key, r_secrets.recv_key);
        assert_eq!(i_secrets.recv_key, r_secrets.send_key);
        assert_eq!(i_secrets.session_id, r_secrets.session_id);
        assert_eq!(i_secrets.epoch, 0);
        assert_eq!(r_secrets.epoch, 0);
        assert_eq!(params, TransportParameters::default());
    }

    #[test]
    fn mismatched_psk_fails_at_responder() {
        let mut rng = OsRng;
        let (_initiator, msg1) = Initiator::new(psk(), &mut rng);
        let wrong_responder =
            Responder::new(PreSharedKey::derive("a different secret entirely").unwrap(), TransportParameters::default());
        assert!(matches!(wrong_responder.respond(&msg1, &mut rng), Err(HandshakeError::Mac1Mismatch)));
    }

    #[test]
    fn mismatched_psk_fails_at_initiator() {
        let mut rng = OsRng;
        let (initiator, msg1) = Initiator::new(psk(), &mut rng);
        let responder = Responder::new(psk(), TransportParameters::default());
        let (mut msg2, _) = responder.respond(&msg1, &mut rng).unwrap();
        msg2.mac2[0] ^= 0xff;
        assert!(matches!(initiator.finalize(&msg2), Err(HandshakeError::Mac2Mismatch)));
    }

    #[test]
    fn out_of_range_transport_parameters_rejected() {
        let mut rng = OsRng;
        let (initiator, msg1) = Initiator::new(psk(), &mut rng);
        let responder = Responder::new(psk(), TransportParameters::default());
        let (mut msg2, _) = responder.respond(&msg1, &mut rng).unwrap();
        // Tamper with the (authenticated) params without recomputing MAC2 —
        // this must fail MAC verification before range validation even runs.
        msg2.params.keepalive_ms = 100;
        assert!(matches!(initiator.finalize(&msg2), Err(HandshakeError::Mac2Mismatch)));
    }
}
