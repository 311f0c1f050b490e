//! End-to-end proxy path: a non-validating gateway forwards queries over
//! real gRPC to a validating gateway serving from its own ledger copy.

use std::net::SocketAddr;
use std::sync::Arc;

use prost::Message;
use slog::Logger;
use tokio::net::TcpListener;

use chaingate::config::NodeFlags;
use chaingate::dispatcher::QueryDispatcher;
use chaingate::error::QueryError;
use chaingate::ledger::MemoryLedger;
use chaingate::peers::StaticPeerDirectory;
use chaingate::proxy::GrpcQueryProxy;
use chaingate::server::{GatewayServer, ServerConfig};
use chaingate_proto::{
    Block, DeploymentSpec, PeerEndpoint, PeerType, Transaction, TransactionType,
};

fn test_logger() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

fn endpoint(address: &str, r#type: PeerType) -> PeerEndpoint {
    PeerEndpoint {
        address: address.to_string(),
        r#type: r#type as i32,
    }
}

fn deploy_block() -> Block {
    Block {
        transactions: vec![Transaction {
            txid: "deploy-1".to_string(),
            r#type: TransactionType::ChaincodeDeploy as i32,
            payload: DeploymentSpec {
                name: "asset_mgmt".to_string(),
                version: "1.0.0".to_string(),
                code_package: vec![0xCC; 512],
            }
            .encode_to_vec(),
            timestamp: 42,
        }],
        previous_block_hash: vec![],
        state_hash: vec![3; 32],
        timestamp: 42,
    }
}

fn dispatcher(
    ledger: Arc<MemoryLedger>,
    peers: Vec<PeerEndpoint>,
    validating: bool,
) -> Arc<QueryDispatcher> {
    let role = if validating {
        PeerType::Validator
    } else {
        PeerType::NonValidator
    };
    let directory = Arc::new(StaticPeerDirectory::new(peers, endpoint("self:0", role)));
    Arc::new(QueryDispatcher::new(
        ledger,
        directory,
        Arc::new(GrpcQueryProxy),
        NodeFlags::new(validating, false),
        test_logger(),
    ))
}

/// Bind an ephemeral port and serve a validating gateway on it.
async fn spawn_validating_gateway(ledger: Arc<MemoryLedger>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GatewayServer::new(
        ServerConfig { listen_addr: addr },
        dispatcher(ledger, vec![], true),
        test_logger(),
    );

    tokio::spawn(server.serve_with_incoming_shutdown(listener, std::future::pending()));

    addr
}

#[tokio::test]
async fn block_count_is_proxied_unchanged() {
    let remote_ledger = Arc::new(MemoryLedger::new());
    remote_ledger.append_block(Block::default());
    remote_ledger.append_block(deploy_block());
    let addr = spawn_validating_gateway(Arc::clone(&remote_ledger)).await;

    let client = dispatcher(
        Arc::new(MemoryLedger::new()),
        vec![endpoint(&addr.to_string(), PeerType::Validator)],
        false,
    );

    let count = client.block_count().await.unwrap();
    assert_eq!(count.count, 2);
}

#[tokio::test]
async fn proxied_block_arrives_sanitized() {
    let remote_ledger = Arc::new(MemoryLedger::new());
    remote_ledger.append_block(deploy_block());
    let addr = spawn_validating_gateway(Arc::clone(&remote_ledger)).await;

    let client = dispatcher(
        Arc::new(MemoryLedger::new()),
        vec![endpoint(&addr.to_string(), PeerType::Validator)],
        false,
    );

    // The validating node sanitizes on its local path; the proxy passes
    // the response through verbatim.
    let block = client.block_by_number(0).await.unwrap();
    let spec = DeploymentSpec::decode(block.transactions[0].payload.as_slice()).unwrap();
    assert!(spec.code_package.is_empty());
    assert_eq!(spec.name, "asset_mgmt");
}

#[tokio::test]
async fn remote_not_found_passes_through_the_wire() {
    let remote_ledger = Arc::new(MemoryLedger::new());
    remote_ledger.append_block(Block::default());
    let addr = spawn_validating_gateway(Arc::clone(&remote_ledger)).await;

    let client = dispatcher(
        Arc::new(MemoryLedger::new()),
        vec![endpoint(&addr.to_string(), PeerType::Validator)],
        false,
    );

    let err = client.block_by_number(99).await.unwrap_err();
    assert!(matches!(err, QueryError::NotFound));
}

#[tokio::test]
async fn remote_empty_chain_passes_through_the_wire() {
    let addr = spawn_validating_gateway(Arc::new(MemoryLedger::new())).await;

    let client = dispatcher(
        Arc::new(MemoryLedger::new()),
        vec![endpoint(&addr.to_string(), PeerType::Validator)],
        false,
    );

    let err = client.blockchain_info().await.unwrap_err();
    assert!(matches!(err, QueryError::EmptyChain));
}

#[tokio::test]
async fn unreachable_validator_is_a_proxy_error() {
    // Bind a listener and drop it so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = dispatcher(
        Arc::new(MemoryLedger::new()),
        vec![endpoint(&addr.to_string(), PeerType::Validator)],
        false,
    );

    let err = client.block_count().await.unwrap_err();
    match err {
        QueryError::Proxy { target, .. } => assert_eq!(target, addr.to_string()),
        other => panic!("expected Proxy, got {other:?}"),
    }
}

#[tokio::test]
async fn transaction_is_proxied_by_id() {
    let remote_ledger = Arc::new(MemoryLedger::new());
    remote_ledger.append_block(deploy_block());
    let addr = spawn_validating_gateway(Arc::clone(&remote_ledger)).await;

    let client = dispatcher(
        Arc::new(MemoryLedger::new()),
        vec![endpoint(&addr.to_string(), PeerType::Validator)],
        false,
    );

    let tx = client.transaction_by_id("deploy-1").await.unwrap();
    assert_eq!(tx.timestamp, 42);
    // Fetching the individual transaction keeps the full payload; only
    // block responses are sanitized.
    let spec = DeploymentSpec::decode(tx.payload.as_slice()).unwrap();
    assert_eq!(spec.code_package.len(), 512);
}
