//! Query dispatch: local-authority vs proxy routing, and response shaping.

use std::sync::Arc;

use prost::Message;
use slog::Logger;

use chaingate_proto::{
    Block, BlockCount, BlockchainInfo, DeploymentSpec, PeerEndpoint, Transaction, TransactionType,
};

use crate::config::NodeFlags;
use crate::error::QueryError;
use crate::ledger::{LedgerError, LedgerReader};
use crate::peers::PeerDirectory;
use crate::proxy::RemoteQuery;
use crate::selector::ValidatorSelector;

/// Where a query is answered: the local ledger copy, or a remote
/// validator picked for this one call.
enum QuerySource {
    Local,
    Proxy { target: String },
}

/// The gateway facade.
///
/// Routes each read-only query to the local ledger when this node
/// validates, or to a randomly chosen validator otherwise, and strips
/// deploy-transaction code packages from locally served blocks. Holds no
/// mutable state of its own; the role and privacy flags are read fresh on
/// every call.
pub struct QueryDispatcher {
    ledger: Arc<dyn LedgerReader>,
    directory: Arc<dyn PeerDirectory>,
    selector: ValidatorSelector,
    proxy: Arc<dyn RemoteQuery>,
    flags: Arc<NodeFlags>,
    logger: Logger,
}

impl QueryDispatcher {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        directory: Arc<dyn PeerDirectory>,
        proxy: Arc<dyn RemoteQuery>,
        flags: Arc<NodeFlags>,
        logger: Logger,
    ) -> Self {
        let selector = ValidatorSelector::new(Arc::clone(&directory));
        Self {
            ledger,
            directory,
            selector,
            proxy,
            flags,
            logger,
        }
    }

    /// The role is read fresh here; the proxy target is picked once and
    /// used for the whole operation.
    fn query_source(&self) -> Result<QuerySource, QueryError> {
        if self.flags.is_validating() {
            return Ok(QuerySource::Local);
        }
        let target = self.selector.select_validator()?;
        slog::debug!(self.logger, "forwarding query"; "target" => %target);
        Ok(QuerySource::Proxy { target })
    }

    /// Blockchain height and block hashes.
    pub async fn blockchain_info(&self) -> Result<BlockchainInfo, QueryError> {
        match self.query_source()? {
            QuerySource::Proxy { target } => self.proxy.blockchain_info(&target).await,
            QuerySource::Local => {
                let info = self.ledger.blockchain_info().map_err(|err| {
                    storage_error("get_blockchain_info", "chain head".to_string(), err)
                })?;
                if info.height == 0 {
                    return Err(QueryError::EmptyChain);
                }
                Ok(info)
            }
        }
    }

    /// Block at the given number, with deploy payloads sanitized on the
    /// local path. The remote path returns verbatim: the validator
    /// answering it sanitizes on its own local path.
    pub async fn block_by_number(&self, number: u64) -> Result<Block, QueryError> {
        match self.query_source()? {
            QuerySource::Proxy { target } => self.proxy.block_by_number(&target, number).await,
            QuerySource::Local => {
                let block = self.ledger.block_by_number(number).map_err(|err| match err {
                    LedgerError::OutOfBounds => QueryError::NotFound,
                    other => storage_error("get_block_by_number", format!("block {number}"), other),
                })?;
                self.sanitize_block(block)
            }
        }
    }

    /// Total number of blocks in the chain.
    pub async fn block_count(&self) -> Result<BlockCount, QueryError> {
        match self.query_source()? {
            QuerySource::Proxy { target } => self.proxy.block_count(&target).await,
            QuerySource::Local => {
                // The genesis block always exists, so a zero-size chain is
                // an error, not a valid count.
                let count = self.ledger.blockchain_size();
                if count == 0 {
                    return Err(QueryError::EmptyChain);
                }
                Ok(BlockCount { count })
            }
        }
    }

    /// Transaction matching the given id.
    pub async fn transaction_by_id(&self, id: &str) -> Result<Transaction, QueryError> {
        match self.query_source()? {
            QuerySource::Proxy { target } => self.proxy.transaction_by_id(&target, id).await,
            QuerySource::Local => self.ledger.transaction_by_id(id).map_err(|err| match err {
                LedgerError::NotFound => QueryError::NotFound,
                other => storage_error("get_transaction_by_id", format!("transaction {id}"), other),
            }),
        }
    }

    /// World-state value for a chaincode id and key.
    ///
    /// Always served from the local ledger, in both roles. This asymmetry
    /// with the block and transaction queries is intentional and
    /// preserved from the original design.
    pub fn state(&self, chaincode_id: &str, key: &str) -> Result<Vec<u8>, QueryError> {
        self.ledger.state(chaincode_id, key, true).map_err(|err| {
            storage_error("get_state", format!("{chaincode_id}/{key}"), err)
        })
    }

    /// All peers currently known to this node.
    pub fn peers(&self) -> Result<Vec<PeerEndpoint>, QueryError> {
        self.directory.peers().map_err(QueryError::Directory)
    }

    /// This node's own endpoint descriptor.
    pub fn peer_endpoint(&self) -> Result<PeerEndpoint, QueryError> {
        self.directory.self_endpoint().map_err(QueryError::Directory)
    }

    /// Strip the code package from every deploy transaction in the block.
    ///
    /// When privacy mode is on, payloads are ciphertext and expected to
    /// fail decoding; the deployment spec is then replaced by an empty
    /// one ("code package redacted, metadata unknown") and the query
    /// continues. With privacy off, a payload that does not decode is a
    /// real fault and fails the whole request.
    fn sanitize_block(&self, mut block: Block) -> Result<Block, QueryError> {
        for tx in &mut block.transactions {
            if tx.r#type != TransactionType::ChaincodeDeploy as i32 {
                continue;
            }

            let mut spec = match DeploymentSpec::decode(tx.payload.as_slice()) {
                Ok(spec) => spec,
                Err(_) if self.flags.privacy_enabled() => DeploymentSpec::default(),
                Err(source) => {
                    return Err(QueryError::MalformedPayload {
                        txid: tx.txid.clone(),
                        source,
                    });
                }
            };

            spec.code_package.clear();
            tx.payload = spec.encode_to_vec();
        }
        Ok(block)
    }
}

fn storage_error(op: &'static str, context: String, source: LedgerError) -> QueryError {
    QueryError::Storage {
        op,
        context,
        source: anyhow::Error::new(source),
    }
}
