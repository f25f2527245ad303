use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

/// The example value that appears in STP's own documentation. A deployment
/// that copy-pastes it instead of generating a real secret gets rejected at
/// construction time rather than silently running unauthenticated-in-all-
/// but-name.
const DOCUMENTED_EXAMPLE_PSK: &str = "0123456789abcdef0123456789abcdef";

/// Below this many raw bytes a PSK is rejected outright rather than hashed:
/// hashing a weak input just gives you a well-formed-looking weak key.
const MIN_PSK_BYTES: usize = 8;

/// The 32-byte symmetric secret shared by both endpoints of a tunnel.
///
/// Derived from a caller-supplied UTF-8 string: hashed with SHA-256 if
/// shorter than 32 bytes, else truncated to 32 (§3).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PreSharedKey([u8; 32]);

impl PreSharedKey {
    /// Derive a `PreSharedKey` from caller-supplied key material.
    ///
    /// # Errors
    /// [`CryptoError::EmptyPsk`] if `raw` is empty, [`CryptoError::DefaultPsk`]
    /// if it is exactly the documented example value.
    pub fn derive(raw: &str) -> Result<Self, CryptoError> {
        if raw.is_empty() {
            return Err(CryptoError::EmptyPsk);
        }
        if raw.len() < MIN_PSK_BYTES {
            return Err(CryptoError::PskTooShort);
        }
        if raw == DOCUMENTED_EXAMPLE_PSK {
            return Err(CryptoError::DefaultPsk);
        }

        let bytes = raw.as_bytes();
        let key = if bytes.len() < 32 {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            hasher.finalize().into()
        } else {
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes[..32]);
            key
        };
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PreSharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreSharedKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_key_is_hashed() {
        let psk = PreSharedKey::derive("hello world!").unwrap();
        assert_eq!(psk.as_bytes().len(), 32);
    }

    #[test]
    fn long_key_is_truncated() {
        let raw = "a".repeat(64);
        let psk = PreSharedKey::derive(&raw).unwrap();
        assert_eq!(psk.as_bytes(), &raw.as_bytes()[..32]);
    }

    #[test]
    fn empty_key_rejected() {
        assert!(matches!(PreSharedKey::derive(""), Err(CryptoError::EmptyPsk)));
    }

    #[test]
    fn too_short_key_rejected() {
        assert!(matches!(PreSharedKey::derive("hello"), Err(CryptoError::PskTooShort)));
    }

    #[test]
    fn documented_example_rejected() {
        assert!(matches!(
            PreSharedKey::derive(DOCUMENTED_EXAMPLE_PSK),
            Err(CryptoError::DefaultPsk)
        ));
    }
}
