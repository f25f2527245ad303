use std::time::Duration;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{hkdf_extract_expand, CryptoError};

/// Default keepalive interval (§3); also the lower bound enforced by
/// [`TransportParameters::new`].
pub const MIN_KEEPALIVE: Duration = Duration::from_secs(5);
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_PADDING: u8 = 96;

/// The output of a successful handshake or rekey: role-asymmetric keys plus
/// the epoch they belong to (§3). `send_key`/`recv_key`/`obfuscation_key`
/// are wiped on drop; `session_id` and `epoch` are not secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionSecrets {
    pub send_key: [u8; 32],
    pub recv_key: [u8; 32],
    pub obfuscation_key: [u8; 32],
    #[zeroize(skip)]
    pub session_id: [u8; 16],
    #[zeroize(skip)]
    pub epoch: u32,
}

impl std::fmt::Debug for SessionSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSecrets")
            .field("send_key", &"<redacted>")
            .field("recv_key", &"<redacted>")
            .field("obfuscation_key", &"<redacted>")
            .field("session_id", &hex::encode(self.session_id))
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Parameters fixed for the life of an epoch, authenticated (not encrypted)
/// at handshake time; the responder is authoritative (§3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportParameters {
    pub keepalive: Duration,
    pub max_padding: u8,
}

impl Default for TransportParameters {
    fn default() -> Self {
        TransportParameters { keepalive: DEFAULT_KEEPALIVE, max_padding: DEFAULT_MAX_PADDING }
    }
}

impl TransportParameters {
    /// Construct, enforcing the `keepalive >= 5s` floor (§3). `max_padding`
    /// has no floor — `0` just disables padding.
    pub fn new(keepalive: Duration, max_padding: u8) -> Option<Self> {
        if keepalive < MIN_KEEPALIVE {
            return None;
        }
        Some(TransportParameters { keepalive, max_padding })
    }
}

/// Derive a fresh [`SessionSecrets`] from a Diffie-Hellman output, shared by
/// both the handshake (§4.2: `root_info = "stp/root"`, `salt = N_i || N_r`,
/// `epoch = 0`) and the rekey protocol (§4.4: `root_info = "stp/rekey"`,
/// `salt = old_session_id || nonce`, `epoch = target`).
///
/// `root = HKDF(shared_secret, salt, root_info, 64)` splits into
/// `k_first_to_second = root[0..32]` and `k_second_to_first = root[32..64]`;
/// `is_first_party` selects which half becomes `send_key`. Both `obf` and
/// `sid` are always derived from `root` with the fixed info strings
/// `"stp/obfs"` / `"stp/sid"`, regardless of caller.
pub fn derive_session_secrets(
    shared_secret: &[u8; 32],
    salt: &[u8],
    root_info: &[u8],
    is_first_party: bool,
    epoch: u32,
) -> Result<SessionSecrets, CryptoError> {
    let mut root = [0u8; 64];
    hkdf_extract_expand(shared_secret, salt, root_info, &mut root)?;

    let mut obfuscation_key = [0u8; 32];
    hkdf_extract_expand(&root, salt, b"stp/obfs", &mut obfuscation_key)?;

    let mut session_id = [0u8; 16];
    hkdf_extract_expand(&root, salt, b"stp/sid", &mut session_id)?;

    let k_first_to_second: [u8; 32] = root[0..32].try_into().unwrap();
    let k_second_to_first: [u8; 32] = root[32..64].try_into().unwrap();
    root.zeroize();

    let (send_key, recv_key) = if is_first_party {
        (k_first_to_second, k_second_to_first)
    } else {
        (k_second_to_first, k_first_to_second)
    };

    Ok(SessionSecrets { send_key, recv_key, obfuscation_key, session_id, epoch })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_session_secrets_agrees_both_parties() {
        let shared = [5u8; 32];
        let salt = b"some-salt";
        let initiator = derive_session_secrets(&shared, salt, b"stp/root", true, 0).unwrap();
        let responder = derive_session_secrets(&shared, salt, b"stp/root", false, 0).unwrap();
        assert_eq!(initiator.send_key, responder.recv_key);
        assert_eq!(initiator.recv_key, responder.send_key);
        assert_eq!(initiator.obfuscation_key, responder.obfuscation_key);
        assert_eq!(initiator.session_id, responder.session_id);
    }

    #[test]
    fn rejects_keepalive_below_floor() {
        assert!(TransportParameters::new(Duration::from_secs(1), 96).is_none());
    }

    #[test]
    fn accepts_keepalive_at_floor() {
        assert!(TransportParameters::new(MIN_KEEPALIVE, 0).is_some());
    }
}
