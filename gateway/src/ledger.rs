//! Read-only access to the local ledger copy.

use std::collections::HashMap;
use std::sync::RwLock;

use chaingate_proto::{Block, BlockchainInfo, Transaction};
use prost::Message;
use thiserror::Error;

/// Errors reported by a ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Block number beyond the current chain height.
    #[error("block number out of bounds")]
    OutOfBounds,

    /// No transaction with the requested id.
    #[error("transaction not found")]
    NotFound,

    /// Any other backend fault.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Read-only view over the local ledger store.
///
/// The gateway treats this view as authoritative when the node runs in
/// validating mode. Implementations own their synchronization; every
/// method may block and may fail.
pub trait LedgerReader: Send + Sync {
    /// Chain height and current/previous block hashes.
    fn blockchain_info(&self) -> Result<BlockchainInfo, LedgerError>;

    /// Block at the given number; the genesis block is block zero.
    fn block_by_number(&self, number: u64) -> Result<Block, LedgerError>;

    /// Total number of blocks in the chain.
    fn blockchain_size(&self) -> u64;

    /// Transaction matching the given id.
    fn transaction_by_id(&self, id: &str) -> Result<Transaction, LedgerError>;

    /// World-state value for a chaincode id and key. Missing keys yield
    /// an empty value.
    fn state(&self, chaincode_id: &str, key: &str, committed_only: bool)
        -> Result<Vec<u8>, LedgerError>;
}

/// In-memory ledger used by tests and local development runs. The real
/// store lives in the surrounding system and is wired in through
/// [`LedgerReader`].
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

#[derive(Default)]
struct MemoryLedgerInner {
    blocks: Vec<Block>,
    state: HashMap<(String, String), Vec<u8>>,
}

fn block_hash(block: &Block) -> Vec<u8> {
    blake3::hash(&block.encode_to_vec()).as_bytes().to_vec()
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block at the next height.
    pub fn append_block(&self, block: Block) {
        self.inner.write().unwrap().blocks.push(block);
    }

    /// Set a world-state value.
    pub fn put_state(&self, chaincode_id: &str, key: &str, value: Vec<u8>) {
        self.inner
            .write()
            .unwrap()
            .state
            .insert((chaincode_id.to_string(), key.to_string()), value);
    }
}

impl LedgerReader for MemoryLedger {
    fn blockchain_info(&self) -> Result<BlockchainInfo, LedgerError> {
        let inner = self.inner.read().unwrap();
        let height = inner.blocks.len() as u64;
        if height == 0 {
            // Height zero is reported as-is; classifying it as an error
            // is the dispatcher's call.
            return Ok(BlockchainInfo::default());
        }
        let current_block_hash = block_hash(&inner.blocks[inner.blocks.len() - 1]);
        let previous_block_hash = if inner.blocks.len() > 1 {
            block_hash(&inner.blocks[inner.blocks.len() - 2])
        } else {
            vec![]
        };
        Ok(BlockchainInfo {
            height,
            current_block_hash,
            previous_block_hash,
        })
    }

    fn block_by_number(&self, number: u64) -> Result<Block, LedgerError> {
        let inner = self.inner.read().unwrap();
        inner
            .blocks
            .get(usize::try_from(number).map_err(|_| LedgerError::OutOfBounds)?)
            .cloned()
            .ok_or(LedgerError::OutOfBounds)
    }

    fn blockchain_size(&self) -> u64 {
        self.inner.read().unwrap().blocks.len() as u64
    }

    fn transaction_by_id(&self, id: &str) -> Result<Transaction, LedgerError> {
        let inner = self.inner.read().unwrap();
        inner
            .blocks
            .iter()
            .flat_map(|block| block.transactions.iter())
            .find(|tx| tx.txid == id)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    fn state(
        &self,
        chaincode_id: &str,
        key: &str,
        _committed_only: bool,
    ) -> Result<Vec<u8>, LedgerError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .state
            .get(&(chaincode_id.to_string(), key.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaingate_proto::TransactionType;

    fn test_block(txid: &str, timestamp: u64) -> Block {
        Block {
            transactions: vec![Transaction {
                txid: txid.to_string(),
                r#type: TransactionType::ChaincodeInvoke as i32,
                payload: vec![1, 2, 3],
                timestamp,
            }],
            previous_block_hash: vec![],
            state_hash: vec![7; 32],
            timestamp,
        }
    }

    #[test]
    fn empty_ledger_reports_height_zero() {
        let ledger = MemoryLedger::new();
        let info = ledger.blockchain_info().unwrap();
        assert_eq!(info.height, 0);
        assert_eq!(ledger.blockchain_size(), 0);
    }

    #[test]
    fn info_tracks_current_and_previous_hashes() {
        let ledger = MemoryLedger::new();
        ledger.append_block(test_block("tx-0", 100));
        ledger.append_block(test_block("tx-1", 101));

        let info = ledger.blockchain_info().unwrap();
        assert_eq!(info.height, 2);
        assert_eq!(info.current_block_hash, block_hash(&test_block("tx-1", 101)));
        assert_eq!(
            info.previous_block_hash,
            block_hash(&test_block("tx-0", 100))
        );
    }

    #[test]
    fn block_by_number_out_of_bounds() {
        let ledger = MemoryLedger::new();
        ledger.append_block(test_block("tx-0", 100));

        assert!(ledger.block_by_number(0).is_ok());
        assert!(matches!(
            ledger.block_by_number(1),
            Err(LedgerError::OutOfBounds)
        ));
    }

    #[test]
    fn transaction_lookup() {
        let ledger = MemoryLedger::new();
        ledger.append_block(test_block("tx-0", 100));
        ledger.append_block(test_block("tx-1", 101));

        let tx = ledger.transaction_by_id("tx-1").unwrap();
        assert_eq!(tx.timestamp, 101);

        assert!(matches!(
            ledger.transaction_by_id("missing"),
            Err(LedgerError::NotFound)
        ));
    }

    #[test]
    fn state_lookup_missing_key_is_empty() {
        let ledger = MemoryLedger::new();
        ledger.put_state("cc1", "balance", b"42".to_vec());

        assert_eq!(ledger.state("cc1", "balance", true).unwrap(), b"42");
        assert!(ledger.state("cc1", "missing", true).unwrap().is_empty());
    }
}
