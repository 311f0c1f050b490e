//! Gateway configuration.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// A peer known to this gateway, as listed in the config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Network address of the peer ("host:port").
    pub address: String,

    /// Whether the peer validates ledger content and can serve proxied
    /// queries.
    #[serde(default)]
    pub validator: bool,
}

/// Configuration for a gateway node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// gRPC server bind address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Address this node advertises to its peers.
    #[serde(default = "default_advertised_addr")]
    pub advertised_addr: String,

    /// Whether this node answers queries from its own ledger copy.
    #[serde(default)]
    pub validating: bool,

    /// Whether deploy payloads on this network are encrypted.
    #[serde(default)]
    pub privacy: bool,

    /// Peers available as proxy targets.
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:50051".parse().unwrap()
}

fn default_advertised_addr() -> String {
    "127.0.0.1:50051".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            advertised_addr: default_advertised_addr(),
            validating: false,
            privacy: false,
            peers: vec![],
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file with env overrides.
    pub fn load(path: &str) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("GATEWAY_"))
            .extract()
            .map_err(Box::new)
    }

    /// Runtime flags seeded from this configuration.
    pub fn flags(&self) -> Arc<NodeFlags> {
        NodeFlags::new(self.validating, self.privacy)
    }
}

/// Node role and privacy flags.
///
/// Read fresh on every query, never cached at startup, so flipping a flag
/// takes effect without a restart.
#[derive(Debug, Default)]
pub struct NodeFlags {
    validating: AtomicBool,
    privacy: AtomicBool,
}

impl NodeFlags {
    pub fn new(validating: bool, privacy: bool) -> Arc<Self> {
        Arc::new(Self {
            validating: AtomicBool::new(validating),
            privacy: AtomicBool::new(privacy),
        })
    }

    /// Whether this node currently answers queries from its local ledger.
    pub fn is_validating(&self) -> bool {
        self.validating.load(Ordering::Acquire)
    }

    pub fn set_validating(&self, on: bool) {
        self.validating.store(on, Ordering::Release);
    }

    /// Whether deploy payloads are expected to be encrypted.
    pub fn privacy_enabled(&self) -> bool {
        self.privacy.load(Ordering::Acquire)
    }

    pub fn set_privacy(&self, on: bool) {
        self.privacy.store(on, Ordering::Release);
    }
}
