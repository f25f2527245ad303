//! Cipher primitives for the STP tunneling protocol core.
//!
//! This crate has no notion of handshakes, frames, or peers — it only
//! wraps the small set of primitives the rest of the workspace is built
//! from: HKDF-SHA256, X25519, ChaCha20-Poly1305, and constant-time
//! comparison. Every other crate's error type wraps [`CryptoError`] rather
//! than re-deriving these failure modes.

mod keys;
mod psk;
mod session;

pub use keys::{EphemeralPrivateKey, PublicKey, StaticPrivateKey};
pub use psk::PreSharedKey;
pub use session::{
    SessionSecrets, TransportParameters, DEFAULT_KEEPALIVE, DEFAULT_MAX_PADDING, MIN_KEEPALIVE,
};

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Length in bytes of the ChaCha20-Poly1305 authentication tag.
pub const TAG_LEN: usize = 16;

/// Length in bytes of the AEAD nonce used throughout the record layer.
pub const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("AEAD authentication failed")]
    Aead,
    #[error("HKDF output length is invalid for this expand call")]
    InvalidLength,
    #[error("pre-shared key must not be empty")]
    EmptyPsk,
    #[error("pre-shared key is shorter than the minimum of 8 bytes")]
    PskTooShort,
    #[error("pre-shared key matches the documented example value and must not be used")]
    DefaultPsk,
}

/// HKDF-SHA256 extract-then-expand into `out`.
///
/// `out.len()` may be anything HKDF-SHA256 supports (up to 255 * 32 bytes);
/// larger requests return [`CryptoError::InvalidLength`].
pub fn hkdf_extract_expand(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    out: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    hk.expand(info, out).map_err(|_| CryptoError::InvalidLength)
}

/// Convenience wrapper returning a freshly allocated `Vec<u8>` of `len` bytes.
pub fn hkdf_extract_expand_vec(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    len: usize,
) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; len];
    hkdf_extract_expand(ikm, salt, info, &mut out)?;
    Ok(out)
}

/// HMAC-SHA256, truncated to `out.len()` bytes (callers ask for 16-byte MACs).
pub fn hmac_sha256(key: &[u8], data: &[u8], out: &mut [u8]) {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    let full = mac.finalize().into_bytes();
    let n = out.len().min(full.len());
    out[..n].copy_from_slice(&full[..n]);
}

/// X25519 scalar multiplication: `scalar * point`.
pub fn x25519(scalar: &EphemeralPrivateKey, point: &PublicKey) -> [u8; 32] {
    scalar.diffie_hellman(point)
}

/// Build the 12-byte AEAD nonce for a given 64-bit counter: 4 zero bytes
/// followed by the big-endian counter, per the record-layer wire format.
pub fn counter_nonce(counter: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[4..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

/// Seal `plaintext` with ChaCha20-Poly1305, appending the 16-byte tag.
pub fn aead_seal(key: &[u8; 32], nonce: &[u8; NONCE_LEN], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
    use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, KeyInit, Nonce};

    let cipher = ChaCha20Poly1305::new(key.into());
    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            chacha20poly1305::aead::Payload { msg: plaintext, aad },
        )
        .expect("ChaCha20-Poly1305 encryption is infallible for valid key/nonce lengths")
}

/// Open a ChaCha20-Poly1305 ciphertext (including trailing tag).
pub fn aead_open(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, KeyInit, Nonce};

    let cipher = ChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            chacha20poly1305::aead::Payload { msg: ciphertext, aad },
        )
        .map_err(|_| CryptoError::Aead)
}

/// Constant-time byte-slice equality. Returns `false` immediately (no
/// comparison performed) if the lengths differ — length is not secret here.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aead_round_trip() {
        let key = [7u8; 32];
        let nonce = counter_nonce(42);
        let aad = [1u8, 2];
        let ct = aead_seal(&key, &nonce, &aad, b"hello world");
        let pt = aead_open(&key, &nonce, &aad, &ct).unwrap();
        assert_eq!(pt, b"hello world");
    }

    #[test]
    fn aead_open_rejects_tampered_ciphertext() {
        let key = [7u8; 32];
        let nonce = counter_nonce(0);
        let mut ct = aead_seal(&key, &nonce, &[], b"payload");
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert!(aead_open(&key, &nonce, &[], &ct).is_err());
    }

    #[test]
    fn constant_time_eq_matches_plain_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn counter_nonce_is_big_endian_low_8_bytes() {
        let n = counter_nonce(1);
        assert_eq!(n, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }
}
