//! Validator selection over the peer directory.

use std::sync::Arc;

use chaingate_proto::PeerType;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::peers::PeerDirectory;

/// Why no proxy target could be produced.
#[derive(Debug, Error)]
pub enum SelectError {
    /// The peer set fetch itself failed. Kept distinct from the query
    /// succeeding with an empty result.
    #[error("peer directory lookup failed: {0}")]
    Directory(#[source] anyhow::Error),

    /// The fetch succeeded but no peer has the validator role.
    #[error("no validator peer available")]
    NoValidator,
}

/// Picks a proxy target uniformly at random among validating peers.
pub struct ValidatorSelector {
    directory: Arc<dyn PeerDirectory>,
}

impl ValidatorSelector {
    pub fn new(directory: Arc<dyn PeerDirectory>) -> Self {
        Self { directory }
    }

    /// Snapshot the peer set, keep validator-role addresses, draw one.
    ///
    /// The draw uses the process-lifetime thread RNG, reseeded per
    /// process start: selection spreads proxy load across validators and
    /// must not converge on a single target across restarts.
    pub fn select_validator(&self) -> Result<String, SelectError> {
        let peers = self.directory.peers().map_err(SelectError::Directory)?;

        let validators: Vec<String> = peers
            .into_iter()
            .filter(|peer| peer.r#type == PeerType::Validator as i32)
            .map(|peer| peer.address)
            .collect();

        validators
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(SelectError::NoValidator)
    }
}
