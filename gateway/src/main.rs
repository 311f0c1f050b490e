//! Gateway binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use slog::{Drain, Logger};

use chaingate::config::GatewayConfig;
use chaingate::dispatcher::QueryDispatcher;
use chaingate::ledger::MemoryLedger;
use chaingate::peers::StaticPeerDirectory;
use chaingate::proxy::GrpcQueryProxy;
use chaingate::server::{GatewayServer, ServerConfig};

/// Chaingate - routes read-only ledger queries to the local chain copy or
/// to a remote validator.
#[derive(Parser, Debug)]
#[command(name = "chaingate")]
#[command(about = "Ledger query gateway")]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Override gRPC bind address.
    #[arg(long)]
    listen_addr: Option<String>,

    /// Run as a validating node regardless of the config file.
    #[arg(long)]
    validating: bool,
}

fn create_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, slog::o!())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let logger = create_logger();

    slog::info!(logger, "Starting chaingate gateway";
        "config" => %args.config.display()
    );

    // Load configuration
    let mut config = if args.config.exists() {
        GatewayConfig::load(args.config.to_str().unwrap())
            .context("Failed to load configuration")?
    } else {
        slog::warn!(logger, "Config file not found, using defaults");
        GatewayConfig::default()
    };

    // Apply CLI overrides
    if let Some(addr) = args.listen_addr {
        config.listen_addr = addr.parse().context("Invalid listen address")?;
    }
    if args.validating {
        config.validating = true;
    }

    slog::info!(logger, "Gateway configured";
        "validating" => config.validating,
        "privacy" => config.privacy,
        "peers" => config.peers.len(),
    );

    let flags = config.flags();
    let ledger = Arc::new(MemoryLedger::new());
    let directory = Arc::new(StaticPeerDirectory::from_config(&config));
    let dispatcher = Arc::new(QueryDispatcher::new(
        ledger,
        directory,
        Arc::new(GrpcQueryProxy),
        flags,
        logger.clone(),
    ));

    let server = GatewayServer::new(
        ServerConfig {
            listen_addr: config.listen_addr,
        },
        dispatcher,
        logger.clone(),
    );

    server
        .serve_with_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("gRPC server error")?;

    slog::info!(logger, "Gateway stopped");
    Ok(())
}
