//! Peer directory seam.

use anyhow::Result;
use chaingate_proto::{PeerEndpoint, PeerType};

use crate::config::GatewayConfig;

/// Current peer set and this node's own endpoint descriptor.
///
/// The directory is owned by the membership layer and may be mutated
/// underneath us between calls; the gateway only takes per-call snapshots
/// and never writes back.
pub trait PeerDirectory: Send + Sync {
    /// Snapshot of the currently known peers.
    fn peers(&self) -> Result<Vec<PeerEndpoint>>;

    /// This node's own endpoint descriptor.
    fn self_endpoint(&self) -> Result<PeerEndpoint>;
}

/// Directory backed by the static peer list from the config file.
pub struct StaticPeerDirectory {
    peers: Vec<PeerEndpoint>,
    self_endpoint: PeerEndpoint,
}

impl StaticPeerDirectory {
    pub fn new(peers: Vec<PeerEndpoint>, self_endpoint: PeerEndpoint) -> Self {
        Self {
            peers,
            self_endpoint,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let peers = config
            .peers
            .iter()
            .map(|peer| PeerEndpoint {
                address: peer.address.clone(),
                r#type: if peer.validator {
                    PeerType::Validator as i32
                } else {
                    PeerType::NonValidator as i32
                },
            })
            .collect();

        let self_endpoint = PeerEndpoint {
            address: config.advertised_addr.clone(),
            r#type: if config.validating {
                PeerType::Validator as i32
            } else {
                PeerType::NonValidator as i32
            },
        };

        Self::new(peers, self_endpoint)
    }
}

impl PeerDirectory for StaticPeerDirectory {
    fn peers(&self) -> Result<Vec<PeerEndpoint>> {
        Ok(self.peers.clone())
    }

    fn self_endpoint(&self) -> Result<PeerEndpoint> {
        Ok(self.self_endpoint.clone())
    }
}
