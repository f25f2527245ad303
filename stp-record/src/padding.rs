use stp_crypto::hkdf_extract_expand_vec;

const PADDING_INFO: &[u8] = b"stp/padding";

/// Derive `(padlen, padding_bytes)` deterministically from
/// `(obfuscation_key, counter)` (§4.3 step 1, §9 "padding determinism").
///
/// Padding is a pure function of session state, not a per-frame random
/// choice, so the receiver never needs to be told how much padding to
/// expect or skip.
pub fn derive_padding(obfuscation_key: &[u8; 32], counter: u64, max_padding: u8) -> (u8, Vec<u8>) {
    if max_padding == 0 {
        return (0, Vec::new());
    }

    let salt = counter.to_be_bytes();
    // One extra byte selects padlen in [0, max_padding]; the rest is the
    // padding content itself, sized for the worst case and truncated.
    let out = hkdf_extract_expand_vec(obfuscation_key, &salt, PADDING_INFO, 1 + max_padding as usize)
        .expect("HKDF-SHA256 can expand up to 255*32 bytes, far more than max_padding + 1");

    let padlen = out[0] % (max_padding as u16 + 1) as u8;
    let pad_bytes = out[1..1 + padlen as usize].to_vec();
    (padlen, pad_bytes)
}
