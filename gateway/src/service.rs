//! gRPC surface over the query dispatcher.

use std::sync::Arc;

use slog::Logger;
use tonic::{Request, Response, Status};

use chaingate_proto::ledger_query_server::LedgerQuery;
use chaingate_proto::{
    Block, BlockCount, BlockNumber, BlockchainInfo, Empty, PeerEndpoint, PeersList, StateRequest,
    StateResponse, Transaction, TransactionId,
};

use crate::dispatcher::QueryDispatcher;
use crate::error::QueryError;

/// Implementation of the `LedgerQuery` gRPC service.
pub struct LedgerQueryService {
    dispatcher: Arc<QueryDispatcher>,
    logger: Logger,
}

impl LedgerQueryService {
    pub fn new(dispatcher: Arc<QueryDispatcher>, logger: Logger) -> Self {
        Self { dispatcher, logger }
    }

    /// Log the failure once at the boundary, then map it to its status.
    fn reject(&self, op: &'static str, err: QueryError) -> Status {
        slog::error!(self.logger, "query failed"; "op" => op, "error" => %err);
        Status::from(err)
    }
}

#[tonic::async_trait]
impl LedgerQuery for LedgerQueryService {
    async fn get_blockchain_info(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<BlockchainInfo>, Status> {
        self.dispatcher
            .blockchain_info()
            .await
            .map(Response::new)
            .map_err(|err| self.reject("get_blockchain_info", err))
    }

    async fn get_block_by_number(
        &self,
        request: Request<BlockNumber>,
    ) -> Result<Response<Block>, Status> {
        let number = request.into_inner().number;
        self.dispatcher
            .block_by_number(number)
            .await
            .map(Response::new)
            .map_err(|err| self.reject("get_block_by_number", err))
    }

    async fn get_block_count(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<BlockCount>, Status> {
        self.dispatcher
            .block_count()
            .await
            .map(Response::new)
            .map_err(|err| self.reject("get_block_count", err))
    }

    async fn get_transaction_by_id(
        &self,
        request: Request<TransactionId>,
    ) -> Result<Response<Transaction>, Status> {
        let id = request.into_inner().id;
        self.dispatcher
            .transaction_by_id(&id)
            .await
            .map(Response::new)
            .map_err(|err| self.reject("get_transaction_by_id", err))
    }

    async fn get_state(
        &self,
        request: Request<StateRequest>,
    ) -> Result<Response<StateResponse>, Status> {
        let req = request.into_inner();
        self.dispatcher
            .state(&req.chaincode_id, &req.key)
            .map(|value| Response::new(StateResponse { value }))
            .map_err(|err| self.reject("get_state", err))
    }

    async fn get_peers(&self, _request: Request<Empty>) -> Result<Response<PeersList>, Status> {
        self.dispatcher
            .peers()
            .map(|peers| Response::new(PeersList { peers }))
            .map_err(|err| self.reject("get_peers", err))
    }

    async fn get_peer_endpoint(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<PeerEndpoint>, Status> {
        self.dispatcher
            .peer_endpoint()
            .map(Response::new)
            .map_err(|err| self.reject("get_peer_endpoint", err))
    }
}
