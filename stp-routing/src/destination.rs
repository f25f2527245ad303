use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::RouteError;

const IPV4_VERSION_NIBBLE: u8 = 4;
const IPV6_VERSION_NIBBLE: u8 = 6;
const IPV4_DEST_OFFSET: usize = 16;
const IPV6_DEST_OFFSET: usize = 24;

/// Parse the destination address out of a raw IP packet (§4.5), used when an
/// inbound plaintext payload carries no explicit peer name.
pub fn parse_destination(packet: &[u8]) -> Result<IpAddr, RouteError> {
    let first = *packet.first().ok_or(RouteError::Truncated)?;
    let version = first >> 4;

    match version {
        IPV4_VERSION_NIBBLE => {
            let bytes: [u8; 4] = packet
                .get(IPV4_DEST_OFFSET..IPV4_DEST_OFFSET + 4)
                .ok_or(RouteError::Truncated)?
                .try_into()
                .unwrap();
            Ok(IpAddr::V4(Ipv4Addr::from(bytes)))
        }
        IPV6_VERSION_NIBBLE => {
            let bytes: [u8; 16] = packet
                .get(IPV6_DEST_OFFSET..IPV6_DEST_OFFSET + 16)
                .ok_or(RouteError::Truncated)?
                .try_into()
                .unwrap();
            Ok(IpAddr::V6(Ipv6Addr::from(bytes)))
        }
        other => Err(RouteError::UnknownVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_destination() {
        let mut packet = vec![0u8; 20];
        packet[0] = 0x45;
        packet[16..20].copy_from_slice(&[192, 0, 2, 1]);
        assert_eq!(parse_destination(&packet).unwrap(), "192.0.2.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn parses_ipv6_destination() {
        let mut packet = vec![0u8; 40];
        packet[0] = 0x60;
        packet[24..40].copy_from_slice(&[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(parse_destination(&packet).unwrap(), "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn rejects_unknown_version() {
        let packet = vec![0x30u8; 40];
        assert_eq!(parse_destination(&packet), Err(RouteError::UnknownVersion(3)));
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(parse_destination(&[0x45, 0x00]), Err(RouteError::Truncated));
    }

    #[test]
    fn rejects_empty_packet() {
        assert_eq!(parse_destination(&[]), Err(RouteError::Truncated));
    }
}
