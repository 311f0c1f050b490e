//! Generated wire types and gRPC stubs for the chaingate protocol.
//!
//! The `LedgerQuery` service is both served by the gateway and dialed by
//! the gateway's proxy path, so server and client stubs live together.

tonic::include_proto!("chaingate");
