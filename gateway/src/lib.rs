//! Chaingate - a query-routing gateway in front of a distributed ledger.
//!
//! For each read-only ledger query the gateway decides whether this
//! process can answer authoritatively from its own chain copy (validating
//! mode) or must forward the request to a remote validator picked at
//! random from the current peer set. Blocks served from the local path
//! have deploy-transaction code packages stripped before they are
//! returned.
//!
//! The ledger store and the peer membership layer are external
//! collaborators, consumed through the [`ledger::LedgerReader`] and
//! [`peers::PeerDirectory`] traits.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod peers;
pub mod proxy;
pub mod selector;
pub mod server;
pub mod service;

pub use config::{GatewayConfig, NodeFlags, PeerConfig};
pub use dispatcher::QueryDispatcher;
pub use error::QueryError;
pub use ledger::{LedgerError, LedgerReader, MemoryLedger};
pub use peers::{PeerDirectory, StaticPeerDirectory};
pub use proxy::{GrpcQueryProxy, RemoteQuery};
pub use selector::{SelectError, ValidatorSelector};
pub use server::{GatewayServer, ServerConfig};
pub use service::LedgerQueryService;
