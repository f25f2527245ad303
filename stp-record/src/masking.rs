use stp_crypto::hmac_sha256;

const MASK_A_LABEL: u8 = 0x00;
const MASK_B_LABEL: u8 = 0x01;

/// Derive the single-byte masks applied to the flags and padlen bytes of a
/// record (§4.3). Both masks are a function of `(obfuscation_key, counter)`
/// only, so the receiver can recompute them before it has authenticated
/// anything else about the record.
fn mask_byte(obfuscation_key: &[u8; 32], counter: u64, label: u8, out_index: usize) -> u8 {
    let mut input = [0u8; 9];
    input[..8].copy_from_slice(&counter.to_be_bytes());
    input[8] = label;

    let mut mac = [0u8; 16];
    hmac_sha256(obfuscation_key, &input, &mut mac);
    mac[out_index]
}

pub fn mask_a(obfuscation_key: &[u8; 32], counter: u64) -> u8 {
    mask_byte(obfuscation_key, counter, MASK_A_LABEL, 0)
}

pub fn mask_b(obfuscation_key: &[u8; 32], counter: u64) -> u8 {
    mask_byte(obfuscation_key, counter, MASK_B_LABEL, 1)
}

/// XOR is its own inverse, so the same call masks on send and unmasks on
/// receive.
pub fn apply_mask(byte: u8, mask: u8) -> u8 {
    byte ^ mask
}
