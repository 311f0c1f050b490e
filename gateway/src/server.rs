//! Gateway gRPC server hosting the ledger query service.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use slog::Logger;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use chaingate_proto::ledger_query_server::LedgerQueryServer;

use crate::dispatcher::QueryDispatcher;
use crate::service::LedgerQueryService;

/// Configuration for the gateway gRPC server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

/// gRPC server exposing the [`QueryDispatcher`] operations.
pub struct GatewayServer {
    config: ServerConfig,
    dispatcher: Arc<QueryDispatcher>,
    logger: Logger,
}

impl GatewayServer {
    pub fn new(config: ServerConfig, dispatcher: Arc<QueryDispatcher>, logger: Logger) -> Self {
        Self {
            config,
            dispatcher,
            logger,
        }
    }

    /// Start the server and block until it is shut down.
    pub async fn serve(self) -> Result<(), tonic::transport::Error> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server with a graceful shutdown signal.
    ///
    /// The server stops accepting new connections when the `shutdown`
    /// future completes, then waits for in-flight requests to finish.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), tonic::transport::Error>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = self.config.listen_addr;

        slog::info!(self.logger, "Starting gateway gRPC server"; "address" => %addr);

        let service = LedgerQueryService::new(self.dispatcher, self.logger.clone());
        let logger = self.logger;

        let result = Server::builder()
            .add_service(LedgerQueryServer::new(service))
            .serve_with_shutdown(addr, shutdown)
            .await;

        slog::info!(logger, "Gateway gRPC server stopped");

        result
    }

    /// Serve on an already-bound listener. Used by tests that need an
    /// ephemeral port.
    pub async fn serve_with_incoming_shutdown<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), tonic::transport::Error>
    where
        F: Future<Output = ()> + Send,
    {
        let service = LedgerQueryService::new(self.dispatcher, self.logger.clone());

        Server::builder()
            .add_service(LedgerQueryServer::new(service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await
    }
}
