use std::fmt;

use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use x25519_dalek::PublicKey;

/// A 32-byte X25519 scalar that never leaves memory and is wiped on drop.
///
/// Used for both static identity keys and per-handshake ephemerals; the two
/// are distinguished only by how long the holder keeps them around (§3).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StaticPrivateKey(x25519_dalek::StaticSecret);

/// Alias matching the data model's naming; ephemerals are generated per
/// handshake and dropped immediately after the shared secret is derived.
pub type EphemeralPrivateKey = StaticPrivateKey;

impl StaticPrivateKey {
    /// Generate a fresh scalar from a cryptographically secure RNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(x25519_dalek::StaticSecret::random_from_rng(rng))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(x25519_dalek::StaticSecret::from(bytes))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.0)
    }

    /// Raw X25519 scalar multiplication against `point`.
    pub fn diffie_hellman(&self, point: &PublicKey) -> [u8; 32] {
        *self.0.diffie_hellman(point).as_bytes()
    }
}

impl fmt::Debug for StaticPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticPrivateKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn diffie_hellman_agrees_both_directions() {
        let a = StaticPrivateKey::generate(&mut OsRng);
        let b = StaticPrivateKey::generate(&mut OsRng);
        assert_eq!(a.diffie_hellman(&b.public_key()), b.diffie_hellman(&a.public_key()));
    }

    #[test]
    fn debug_never_prints_secret() {
        let a = StaticPrivateKey::from_bytes([9u8; 32]);
        assert_eq!(format!("{:?}", a), "StaticPrivateKey(<redacted>)");
    }
}
