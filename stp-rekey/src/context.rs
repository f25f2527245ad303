use std::time::{Duration, Instant};

use rand_core::{CryptoRng, RngCore};

use stp_crypto::EphemeralPrivateKey;
use stp_wire::RekeyRequest;

/// State an initiator holds between sending a REKEY request and receiving
/// the matching response (§4.4). The responder never holds one of these —
/// its side of the exchange completes in a single step.
pub struct RekeyContext {
    ephemeral: EphemeralPrivateKey,
    nonce: [u8; 16],
    epoch_target: u32,
    created_at: Instant,
}

impl RekeyContext {
    /// Start a rekey: generate the new ephemeral, build the outgoing request.
    pub fn initiate<R: RngCore + CryptoRng>(current_epoch: u32, rng: &mut R) -> (Self, RekeyRequest) {
        let ephemeral = EphemeralPrivateKey::generate(rng);
        let ephemeral_public = *ephemeral.public_key().as_bytes();
        let mut nonce = [0u8; 16];
        rng.fill_bytes(&mut nonce);
        let epoch_target = current_epoch + 1;

        let request = RekeyRequest { ephemeral_public, nonce, epoch_target };
        (Self { ephemeral, nonce, epoch_target, created_at: Instant::now() }, request)
    }

    pub fn ephemeral(&self) -> &EphemeralPrivateKey {
        &self.ephemeral
    }

    pub fn nonce(&self) -> [u8; 16] {
        self.nonce
    }

    pub fn epoch_target(&self) -> u32 {
        self.epoch_target
    }

    /// (R4) A pending context older than `rekey_interval` must be cancelled
    /// and a fresh one initiated rather than waiting indefinitely for a
    /// response that may never arrive.
    pub fn is_stale(&self, rekey_interval: Duration) -> bool {
        self.created_at.elapsed() >= rekey_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn initiate_targets_next_epoch() {
        let (ctx, request) = RekeyContext::initiate(3, &mut OsRng);
        assert_eq!(ctx.epoch_target(), 4);
        assert_eq!(request.epoch_target, 4);
        assert_eq!(request.ephemeral_public, *ctx.ephemeral().public_key().as_bytes());
    }

    #[test]
    fn fresh_context_is_not_stale() {
        let (ctx, _) = RekeyContext::initiate(0, &mut OsRng);
        assert!(!ctx.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn zero_duration_interval_is_immediately_stale() {
        let (ctx, _) = RekeyContext::initiate(0, &mut OsRng);
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.is_stale(Duration::from_millis(1)));
    }
}
