use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use stp_crypto::{PreSharedKey, TransportParameters, DEFAULT_KEEPALIVE, DEFAULT_MAX_PADDING};
use stp_routing::PeerSpec;

const DEFAULT_REKEY_INTERVAL_SECS: u64 = 30 * 60;
const MIN_REKEY_INTERVAL_SECS: u64 = 60;
const DEFAULT_REKEY_BUDGET: u64 = 16_000;
const MIN_REKEY_BUDGET: u64 = 1_000;
const DEFAULT_MTU: u16 = 1420;
const MIN_TUN_MTU: u16 = 576;
const MAX_TUN_MTU: u16 = 65535;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("pre-shared key is invalid: {0}")]
    Psk(#[from] stp_crypto::CryptoError),
    #[error("keepalive must be at least 5s, got {0:?}")]
    KeepaliveTooShort(Duration),
    #[error("rekey interval must be at least {min:?}, got {got:?}")]
    RekeyIntervalTooShort { min: Duration, got: Duration },
    #[error("rekey budget must be at least {min}, got {got}")]
    RekeyBudgetTooSmall { min: u64, got: u64 },
    #[error("tun mtu must be within {min}..={max}, got {got}")]
    InvalidMtu { min: u16, max: u16, got: u16 },
    #[error("peer {0:?} needs an endpoint for the udp-bridge dataplane")]
    MissingPeerEndpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Client,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TunnelType {
    Loopback,
    UdpBridge,
    Tun,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfig {
    pub name: String,
    pub endpoint: Option<SocketAddr>,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelConfig {
    #[serde(rename = "type")]
    pub kind: TunnelType,
    #[serde(default = "default_mtu")]
    pub mtu: u16,
}

fn default_mtu() -> u16 {
    DEFAULT_MTU
}

/// Configuration this core accepts (§6). Parsing it out of JSON/YAML/TOML is
/// a collaborator's job; this struct only derives `Deserialize` so that
/// collaborator can hand one over without this crate caring about the
/// source format. `validate()` is the one piece of config validation that
/// *is* in scope: it is what raises [`ConfigError`] at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub mode: Mode,
    pub psk: String,
    pub endpoint: Option<SocketAddr>,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    #[serde(default = "default_max_padding")]
    pub max_padding: u8,
    #[serde(default = "default_rekey_interval_secs")]
    pub rekey_interval_secs: u64,
    #[serde(default = "default_rekey_budget")]
    pub rekey_budget: u64,
    pub tunnel: TunnelConfig,
}

fn default_keepalive_secs() -> u64 {
    DEFAULT_KEEPALIVE.as_secs()
}

fn default_max_padding() -> u8 {
    DEFAULT_MAX_PADDING
}

fn default_rekey_interval_secs() -> u64 {
    DEFAULT_REKEY_INTERVAL_SECS
}

fn default_rekey_budget() -> u64 {
    DEFAULT_REKEY_BUDGET
}

/// The validated, typed form of [`DeviceConfig`] a `Device` is built from.
pub struct ValidatedConfig {
    pub mode: Mode,
    pub psk: PreSharedKey,
    pub endpoint: Option<SocketAddr>,
    pub peers: Vec<PeerSpec>,
    pub transport_params: TransportParameters,
    pub rekey_interval: Duration,
    pub rekey_budget: u64,
    pub tunnel: TunnelConfig,
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let psk = PreSharedKey::derive(&self.psk)?;

        let keepalive = Duration::from_secs(self.keepalive_secs);
        let transport_params = TransportParameters::new(keepalive, self.max_padding)
            .ok_or(ConfigError::KeepaliveTooShort(keepalive))?;

        let rekey_interval = Duration::from_secs(self.rekey_interval_secs);
        let min_rekey_interval = Duration::from_secs(MIN_REKEY_INTERVAL_SECS);
        if rekey_interval < min_rekey_interval {
            return Err(ConfigError::RekeyIntervalTooShort { min: min_rekey_interval, got: rekey_interval });
        }

        if self.rekey_budget < MIN_REKEY_BUDGET {
            return Err(ConfigError::RekeyBudgetTooSmall { min: MIN_REKEY_BUDGET, got: self.rekey_budget });
        }

        if self.tunnel.kind == TunnelType::Tun
            && !(MIN_TUN_MTU..=MAX_TUN_MTU).contains(&self.tunnel.mtu)
        {
            return Err(ConfigError::InvalidMtu { min: MIN_TUN_MTU, max: MAX_TUN_MTU, got: self.tunnel.mtu });
        }

        let mut peers = Vec::with_capacity(self.peers.len());
        for peer in &self.peers {
            if self.tunnel.kind == TunnelType::UdpBridge && peer.endpoint.is_none() {
                return Err(ConfigError::MissingPeerEndpoint(peer.name.clone()));
            }
            let allowed_prefixes = peer
                .allowed_ips
                .iter()
                .filter_map(|cidr| cidr.parse().ok())
                .collect();
            peers.push(PeerSpec { name: peer.name.clone(), endpoint: peer.endpoint, allowed_prefixes });
        }

        Ok(ValidatedConfig {
            mode: self.mode,
            psk,
            endpoint: self.endpoint,
            peers,
            transport_params,
            rekey_interval,
            rekey_budget: self.rekey_budget,
            tunnel: self.tunnel.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> DeviceConfig {
        DeviceConfig {
            mode: Mode::Client,
            psk: "correct horse battery staple".to_string(),
            endpoint: None,
            peers: vec![],
            keepalive_secs: 15,
            max_padding: 96,
            rekey_interval_secs: 1800,
            rekey_budget: 16_000,
            tunnel: TunnelConfig { kind: TunnelType::Loopback, mtu: 1420 },
        }
    }

    #[test]
    fn psk_too_short_is_a_config_error() {
        let mut config = base_config();
        config.psk = "hello".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Psk(_))));
    }

    #[test]
    fn default_psk_is_a_config_error() {
        let mut config = base_config();
        config.psk = "0123456789abcdef0123456789abcdef".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Psk(_))));
    }

    #[test]
    fn valid_config_validates() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rekey_budget_below_floor_rejected() {
        let mut config = base_config();
        config.rekey_budget = 10;
        assert!(matches!(config.validate(), Err(ConfigError::RekeyBudgetTooSmall { .. })));
    }

    #[test]
    fn udp_bridge_peer_without_endpoint_rejected() {
        let mut config = base_config();
        config.tunnel.kind = TunnelType::UdpBridge;
        config.peers.push(PeerConfig { name: "a".into(), endpoint: None, allowed_ips: vec![] });
        assert!(matches!(config.validate(), Err(ConfigError::MissingPeerEndpoint(_))));
    }

    #[test]
    fn tun_mtu_out_of_range_rejected() {
        let mut config = base_config();
        config.tunnel = TunnelConfig { kind: TunnelType::Tun, mtu: 100 };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMtu { .. })));
    }
}
