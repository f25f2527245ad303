use byteorder::{BigEndian, ByteOrder};

use stp_crypto::{aead_open, aead_seal, counter_nonce, TAG_LEN};
use stp_wire::FrameFlag;

use crate::header::{RecordHeader, HEADER_LEN};
use crate::masking::{apply_mask, mask_a, mask_b};
use crate::padding::derive_padding;
use crate::replay::ReplayWindow;
use crate::RecordError;

/// Minimum body length: masked flags (1) + masked padlen (1) + counter (8)
/// + an empty-payload ciphertext's tag (16).
const MIN_BODY_LEN: usize = 1 + 1 + 8 + TAG_LEN;

/// One direction of sealing state (§4.3). `counter` starts at zero and
/// increments on every sealed frame; it never wraps in practice, since a
/// rekey must happen long before 2^64 frames are sent.
pub struct SendState {
    send_key: [u8; 32],
    obfuscation_key: [u8; 32],
    counter: u64,
    max_padding: u8,
}

impl SendState {
    pub fn new(send_key: [u8; 32], obfuscation_key: [u8; 32], max_padding: u8) -> Self {
        Self { send_key, obfuscation_key, counter: 0, max_padding }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Seal `payload` under `flags` into a complete record (header included).
    pub fn seal_frame(&mut self, flags: FrameFlag, payload: &[u8]) -> Result<Vec<u8>, RecordError> {
        if payload.len() > u16::MAX as usize {
            return Err(RecordError::PayloadTooLarge);
        }
        let counter = self.counter;
        let (padlen, pad_bytes) = derive_padding(&self.obfuscation_key, counter, self.max_padding);

        let mut plaintext = Vec::with_capacity(2 + payload.len());
        plaintext.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        plaintext.extend_from_slice(payload);

        let flags_byte = flags.to_byte();
        let aad = [flags_byte, padlen];
        let nonce = counter_nonce(counter);
        let ciphertext = aead_seal(&self.send_key, &nonce, &aad, &plaintext);

        let masked_flags = apply_mask(flags_byte, mask_a(&self.obfuscation_key, counter));
        let masked_padlen = apply_mask(padlen, mask_b(&self.obfuscation_key, counter));

        let mut body = Vec::with_capacity(10 + ciphertext.len() + pad_bytes.len());
        body.push(masked_flags);
        body.push(masked_padlen);
        body.extend_from_slice(&counter.to_be_bytes());
        body.extend_from_slice(&ciphertext);
        body.extend_from_slice(&pad_bytes);

        if body.len() > u16::MAX as usize {
            return Err(RecordError::PayloadTooLarge);
        }
        let header = RecordHeader { length: body.len() as u16 };

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&header.encode());
        out.extend_from_slice(&body);

        self.counter += 1;
        Ok(out)
    }
}

/// The receiving counterpart of [`SendState`]: independent key, independent
/// counter tracked via [`ReplayWindow`].
pub struct RecvState {
    recv_key: [u8; 32],
    obfuscation_key: [u8; 32],
    replay: ReplayWindow,
}

impl RecvState {
    pub fn new(recv_key: [u8; 32], obfuscation_key: [u8; 32]) -> Self {
        Self { recv_key, obfuscation_key, replay: ReplayWindow::new() }
    }

    /// Open a complete record (header included), returning the frame's
    /// flags, plaintext payload, and accepted counter.
    pub fn open_frame(&mut self, record: &[u8]) -> Result<(FrameFlag, Vec<u8>, u64), RecordError> {
        let header = RecordHeader::decode(record)?;
        let body = record
            .get(HEADER_LEN..HEADER_LEN + header.length as usize)
            .ok_or(RecordError::Truncated)?;
        if body.len() < MIN_BODY_LEN {
            return Err(RecordError::Truncated);
        }

        let masked_flags = body[0];
        let masked_padlen = body[1];
        let counter = BigEndian::read_u64(&body[2..10]);

        let flags_byte = apply_mask(masked_flags, mask_a(&self.obfuscation_key, counter));
        let padlen = apply_mask(masked_padlen, mask_b(&self.obfuscation_key, counter));

        let remaining = &body[10..];
        let padlen_usize = padlen as usize;
        if padlen_usize > remaining.len() {
            return Err(RecordError::BadPadding);
        }
        let ciphertext_len = remaining.len() - padlen_usize;
        if ciphertext_len < TAG_LEN {
            return Err(RecordError::Truncated);
        }
        let ciphertext = &remaining[..ciphertext_len];

        let aad = [flags_byte, padlen];
        let nonce = counter_nonce(counter);
        let plaintext = aead_open(&self.recv_key, &nonce, &aad, ciphertext).map_err(|_| RecordError::Aead)?;

        if plaintext.len() < 2 {
            return Err(RecordError::Truncated);
        }
        let declared_len = BigEndian::read_u16(&plaintext[0..2]) as usize;
        if declared_len != plaintext.len() - 2 {
            return Err(RecordError::LengthMismatch);
        }
        let payload = plaintext[2..].to_vec();

        let flags = FrameFlag::from_byte(flags_byte)?;

        if !self.replay.check_and_advance(counter) {
            return Err(RecordError::Replay);
        }

        Ok((flags, payload, counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(max_padding: u8) -> (SendState, RecvState) {
        let send_key = [1u8; 32];
        let obf = [2u8; 32];
        (SendState::new(send_key, obf, max_padding), RecvState::new(send_key, obf))
    }

    #[test]
    fn round_trip_all_flags() {
        for flag in [FrameFlag::DATA, FrameFlag::KEEPALIVE, FrameFlag::REKEY, FrameFlag::BIND] {
            let (mut send, mut recv) = pair(96);
            let record = send.seal_frame(flag, b"hello").unwrap();
            let (out_flag, payload, counter) = recv.open_frame(&record).unwrap();
            assert_eq!(out_flag, flag);
            assert_eq!(payload, b"hello");
            assert_eq!(counter, 0);
        }
    }

    #[test]
    fn round_trip_empty_payload_no_padding() {
        let (mut send, mut recv) = pair(0);
        let record = send.seal_frame(FrameFlag::KEEPALIVE, b"").unwrap();
        let (flag, payload, _) = recv.open_frame(&record).unwrap();
        assert_eq!(flag, FrameFlag::KEEPALIVE);
        assert!(payload.is_empty());
    }

    #[test]
    fn monotone_send_counter() {
        let (mut send, _recv) = pair(32);
        send.seal_frame(FrameFlag::DATA, b"a").unwrap();
        send.seal_frame(FrameFlag::DATA, b"b").unwrap();
        assert_eq!(send.counter(), 2);
    }

    #[test]
    fn bitflip_in_ciphertext_fails_auth() {
        let (mut send, mut recv) = pair(0);
        let mut record = send.seal_frame(FrameFlag::DATA, b"payload").unwrap();
        let last = record.len() - 1;
        record[last] ^= 0x01;
        assert!(matches!(recv.open_frame(&record), Err(RecordError::Aead)));
    }

    #[test]
    fn replay_rejected_counter_unchanged() {
        let (mut send, mut recv) = pair(0);
        let record = send.seal_frame(FrameFlag::DATA, b"x").unwrap();
        recv.open_frame(&record).unwrap();
        let before = recv.replay.expected();
        assert!(matches!(recv.open_frame(&record), Err(RecordError::Replay)));
        assert_eq!(recv.replay.expected(), before);
    }

    #[test]
    fn out_of_order_counter_rejected() {
        let (mut send, mut recv) = pair(0);
        let r0 = send.seal_frame(FrameFlag::DATA, b"0").unwrap();
        let r1 = send.seal_frame(FrameFlag::DATA, b"1").unwrap();
        recv.open_frame(&r1).unwrap();
        assert!(matches!(recv.open_frame(&r0), Err(RecordError::Replay)));
    }

    #[test]
    fn mismatched_keys_fail_auth() {
        let mut send = SendState::new([1u8; 32], [2u8; 32], 0);
        let mut recv = RecvState::new([9u8; 32], [2u8; 32]);
        let record = send.seal_frame(FrameFlag::DATA, b"x").unwrap();
        assert!(matches!(recv.open_frame(&record), Err(RecordError::Aead)));
    }

    #[test]
    fn padding_is_indistinguishable_in_record_length_distribution() {
        let (mut send, _recv) = pair(96);
        let lengths: Vec<usize> =
            (0..50).map(|_| send.seal_frame(FrameFlag::KEEPALIVE, b"").unwrap().len()).collect();
        let distinct: std::collections::HashSet<_> = lengths.iter().collect();
        assert!(distinct.len() > 1, "padding should vary record length across frames");
    }
}
