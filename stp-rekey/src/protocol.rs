use rand_core::{CryptoRng, RngCore};

use stp_crypto::{derive_session_secrets, EphemeralPrivateKey, PublicKey, SessionSecrets};
use stp_wire::{RekeyRequest, RekeyResponse};

use crate::context::RekeyContext;
use crate::error::RekeyError;

const ROOT_INFO: &[u8] = b"stp/rekey";

fn rekey_salt(old_session_id: [u8; 16], request_nonce: [u8; 16], response_nonce: [u8; 16]) -> Vec<u8> {
    let mut salt = Vec::with_capacity(16 + 16 + 16);
    salt.extend_from_slice(&old_session_id);
    salt.extend_from_slice(&request_nonce);
    salt.extend_from_slice(&response_nonce);
    salt
}

/// Responder side of §4.4: consume a REQUEST, produce the RESPONSE plus the
/// freshly derived secrets, ready for the caller to swap in once the
/// response frame has been sent (R1: the response itself still goes out
/// under the old epoch's keys).
pub fn respond_to_rekey<R: RngCore + CryptoRng>(
    request: &RekeyRequest,
    old_session_id: [u8; 16],
    rng: &mut R,
) -> Result<(RekeyResponse, SessionSecrets), RekeyError> {
    let ephemeral = EphemeralPrivateKey::generate(rng);
    let ephemeral_public = *ephemeral.public_key().as_bytes();
    let mut response_nonce = [0u8; 16];
    rng.fill_bytes(&mut response_nonce);

    let peer_public = PublicKey::from(request.ephemeral_public);
    let shared = ephemeral.diffie_hellman(&peer_public);
    let salt = rekey_salt(old_session_id, request.nonce, response_nonce);

    let secrets = derive_session_secrets(&shared, &salt, ROOT_INFO, false, request.epoch_target)?;
    let response = RekeyResponse { ephemeral_public, nonce: response_nonce };
    Ok((response, secrets))
}

/// Initiator side of §4.4: consume the matching RESPONSE for a pending
/// [`RekeyContext`], producing the same secrets the responder derived.
pub fn complete_rekey(
    ctx: &RekeyContext,
    response: &RekeyResponse,
    old_session_id: [u8; 16],
) -> Result<SessionSecrets, RekeyError> {
    let peer_public = PublicKey::from(response.ephemeral_public);
    let shared = ctx.ephemeral().diffie_hellman(&peer_public);
    let salt = rekey_salt(old_session_id, ctx.nonce(), response.nonce);

    Ok(derive_session_secrets(&shared, &salt, ROOT_INFO, true, ctx.epoch_target())?)
}

/// Resolve a concurrent rekey (R3): when both sides initiate at once, the
/// side that played the RESPONDER role in the original handshake discards
/// its own pending request in favor of the peer's incoming one.
pub fn incoming_request_wins(local_handshake_role_is_initiator: bool) -> bool {
    !local_handshake_role_is_initiator
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn rekey_continuity_no_gap() {
        let old_session_id = [0xabu8; 16];
        let (ctx, request) = RekeyContext::initiate(0, &mut OsRng);

        let (response, responder_secrets) = respond_to_rekey(&request, old_session_id, &mut OsRng).unwrap();
        let initiator_secrets = complete_rekey(&ctx, &response, old_session_id).unwrap();

        assert_eq!(initiator_secrets.send_key, responder_secrets.recv_key);
        assert_eq!(initiator_secrets.recv_key, responder_secrets.send_key);
        assert_eq!(initiator_secrets.session_id, responder_secrets.session_id);
        assert_eq!(initiator_secrets.epoch, 1);
        assert_eq!(responder_secrets.epoch, 1);
    }

    #[test]
    fn epoch_target_is_current_epoch_plus_one() {
        let old_session_id = [1u8; 16];
        let (ctx, request) = RekeyContext::initiate(5, &mut OsRng);
        let (response, responder_secrets) = respond_to_rekey(&request, old_session_id, &mut OsRng).unwrap();
        let initiator_secrets = complete_rekey(&ctx, &response, old_session_id).unwrap();

        assert_eq!(initiator_secrets.epoch, 6);
        assert_eq!(responder_secrets.epoch, 6);
    }

    #[test]
    fn tampered_response_nonce_breaks_agreement() {
        let old_session_id = [2u8; 16];
        let (ctx, request) = RekeyContext::initiate(0, &mut OsRng);
        let (mut response, responder_secrets) = respond_to_rekey(&request, old_session_id, &mut OsRng).unwrap();
        response.nonce[0] ^= 0xff;
        let initiator_secrets = complete_rekey(&ctx, &response, old_session_id).unwrap();
        assert_ne!(initiator_secrets.send_key, responder_secrets.recv_key);
    }

    #[test]
    fn tiebreak_prefers_initiator_role() {
        assert!(!incoming_request_wins(true));
        assert!(incoming_request_wins(false));
    }
}
