//! Query error taxonomy and gRPC status mapping.

use thiserror::Error;
use tonic::Status;

use crate::selector::SelectError;

/// Errors surfaced by the query dispatcher.
///
/// Each variant maps to a distinct gRPC status code so a caller can tell
/// "retry against another node" (`NoValidatorAvailable`, `Directory`,
/// `Proxy`) from "do not retry" (`NotFound`, `EmptyChain`).
#[derive(Debug, Error)]
pub enum QueryError {
    /// The requested block or transaction does not exist.
    #[error("resource not found")]
    NotFound,

    /// The ledger has no blocks yet. Distinct from corruption: there is
    /// simply nothing there.
    #[error("no blocks in blockchain")]
    EmptyChain,

    /// The peer set has no validating member to forward to.
    #[error("no validator peer available")]
    NoValidatorAvailable,

    /// The peer set lookup itself failed.
    #[error("peer directory lookup failed: {0}")]
    Directory(#[source] anyhow::Error),

    /// Dial or RPC failure while forwarding to a validator. Never
    /// downgraded to `NotFound`: a network fault is not a missing
    /// resource.
    #[error("proxy request to {target} failed: {source}")]
    Proxy {
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// Local ledger fault not otherwise classified.
    #[error("storage error during {op} ({context}): {source}")]
    Storage {
        op: &'static str,
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// A deploy-transaction payload failed to decode while privacy mode
    /// was off. With privacy on the same failure is recovered instead.
    #[error("malformed deployment payload in transaction {txid}: {source}")]
    MalformedPayload {
        txid: String,
        #[source]
        source: prost::DecodeError,
    },
}

impl From<SelectError> for QueryError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::NoValidator => QueryError::NoValidatorAvailable,
            SelectError::Directory(source) => QueryError::Directory(source),
        }
    }
}

impl From<QueryError> for Status {
    fn from(err: QueryError) -> Self {
        let message = err.to_string();
        match err {
            QueryError::NotFound => Status::not_found(message),
            QueryError::EmptyChain => Status::failed_precondition(message),
            QueryError::NoValidatorAvailable | QueryError::Directory(_) => {
                Status::unavailable(message)
            }
            QueryError::Proxy { .. } => Status::aborted(message),
            QueryError::Storage { .. } => Status::internal(message),
            QueryError::MalformedPayload { .. } => Status::data_loss(message),
        }
    }
}
