//! Remote query forwarding to a chosen validator.

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use chaingate_proto::ledger_query_client::LedgerQueryClient;
use chaingate_proto::{
    Block, BlockCount, BlockNumber, BlockchainInfo, Empty, Transaction, TransactionId,
};

use crate::error::QueryError;

/// Bound on establishing a proxy connection.
const DIAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound on a single proxied RPC once connected.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One-shot remote execution of a ledger query against a validator.
///
/// A failed attempt is a failed query; retry policy belongs to the
/// caller.
#[async_trait]
pub trait RemoteQuery: Send + Sync {
    async fn blockchain_info(&self, target: &str) -> Result<BlockchainInfo, QueryError>;
    async fn block_by_number(&self, target: &str, number: u64) -> Result<Block, QueryError>;
    async fn block_count(&self, target: &str) -> Result<BlockCount, QueryError>;
    async fn transaction_by_id(&self, target: &str, id: &str) -> Result<Transaction, QueryError>;
}

/// gRPC-backed proxy.
///
/// Opens a fresh plaintext connection per call and drops it on every exit
/// path; no pooling or reuse. Transport security is a deployment concern.
pub struct GrpcQueryProxy;

impl GrpcQueryProxy {
    async fn connect(&self, target: &str) -> Result<LedgerQueryClient<Channel>, QueryError> {
        let endpoint = Endpoint::from_shared(format!("http://{target}"))
            .map_err(|err| proxy_error(target, err))?
            .connect_timeout(DIAL_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);

        let channel = endpoint
            .connect()
            .await
            .map_err(|err| proxy_error(target, err))?;

        Ok(LedgerQueryClient::new(channel))
    }
}

fn proxy_error(target: &str, source: impl Into<anyhow::Error>) -> QueryError {
    QueryError::Proxy {
        target: target.to_string(),
        source: source.into(),
    }
}

/// Application errors from the remote node pass through verbatim where
/// the taxonomy allows; everything else wraps into `Proxy` so a transport
/// fault is never mistaken for a missing resource.
fn remote_error(target: &str, status: Status) -> QueryError {
    match status.code() {
        Code::NotFound => QueryError::NotFound,
        Code::FailedPrecondition => QueryError::EmptyChain,
        _ => proxy_error(target, status),
    }
}

#[async_trait]
impl RemoteQuery for GrpcQueryProxy {
    async fn blockchain_info(&self, target: &str) -> Result<BlockchainInfo, QueryError> {
        let mut client = self.connect(target).await?;
        let response = client
            .get_blockchain_info(Empty {})
            .await
            .map_err(|status| remote_error(target, status))?;
        Ok(response.into_inner())
    }

    async fn block_by_number(&self, target: &str, number: u64) -> Result<Block, QueryError> {
        let mut client = self.connect(target).await?;
        let response = client
            .get_block_by_number(BlockNumber { number })
            .await
            .map_err(|status| remote_error(target, status))?;
        Ok(response.into_inner())
    }

    async fn block_count(&self, target: &str) -> Result<BlockCount, QueryError> {
        let mut client = self.connect(target).await?;
        let response = client
            .get_block_count(Empty {})
            .await
            .map_err(|status| remote_error(target, status))?;
        Ok(response.into_inner())
    }

    async fn transaction_by_id(&self, target: &str, id: &str) -> Result<Transaction, QueryError> {
        let mut client = self.connect(target).await?;
        let response = client
            .get_transaction_by_id(TransactionId { id: id.to_string() })
            .await
            .map_err(|status| remote_error(target, status))?;
        Ok(response.into_inner())
    }
}
