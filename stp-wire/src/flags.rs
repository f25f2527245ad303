use bitflags::bitflags;

use crate::WireError;

bitflags! {
    /// The single flags byte carried (masked) in every record. Exactly one
    /// bit is set per frame — anything else is a [`WireError::InvalidFlags`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlag: u8 {
        /// Payload is a wire packet (§4.8).
        const DATA = 0x01;
        /// Empty payload, sent on the keepalive cadence.
        const KEEPALIVE = 0x02;
        /// Payload is a rekey sub-message (§4.4).
        const REKEY = 0x04;
        /// Empty payload; one-shot path confirmation right after handshake.
        const BIND = 0x08;
    }
}

impl FrameFlag {
    /// Validate that exactly one recognized bit is set, as the wire format
    /// requires, returning it.
    pub fn from_byte(byte: u8) -> Result<Self, WireError> {
        let flag = FrameFlag::from_bits(byte).ok_or(WireError::InvalidFlags(byte))?;
        if flag.bits().count_ones() != 1 {
            return Err(WireError::InvalidFlags(byte));
        }
        Ok(flag)
    }

    pub fn to_byte(self) -> u8 {
        self.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bit_flags_round_trip() {
        for f in [FrameFlag::DATA, FrameFlag::KEEPALIVE, FrameFlag::REKEY, FrameFlag::BIND] {
            assert_eq!(FrameFlag::from_byte(f.to_byte()).unwrap(), f);
        }
    }

    #[test]
    fn zero_bits_rejected() {
        assert!(FrameFlag::from_byte(0x00).is_err());
    }

    #[test]
    fn multiple_bits_rejected() {
        assert!(FrameFlag::from_byte(0x03).is_err());
    }

    #[test]
    fn unknown_bit_rejected() {
        assert!(FrameFlag::from_byte(0x10).is_err());
    }
}
