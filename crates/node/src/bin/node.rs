//! Quorus node binary.
//!
//! Runs the consensus coordinator with an in-process committee and serves
//! the read-only HTTP API.
//!
//! ```bash
//! # Four equal-stake validators, 100ms blocks, API on :8080
//! quorus-node
//!
//! # Larger committee, slower cadence, ephemeral API port
//! quorus-node --validator-count 7 --block-time-ms 250 --listen 127.0.0.1:0
//! ```

use anyhow::Result;
use clap::Parser;
use quorus_node::rpc::{RpcServer, RpcServerConfig};
use quorus_node::{init_telemetry, ConsensusConfig, Coordinator, HonestVoteSource};
use quorus_types::{Address, NodeCrypto, Validator, ValidatorSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Quorus consensus node.
#[derive(Parser, Debug)]
#[command(name = "quorus-node")]
#[command(version, about, long_about = None)]
struct Cli {
    /// HTTP API listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Target block time in milliseconds
    #[arg(long, default_value_t = 100)]
    block_time_ms: u64,

    /// Chain height to resume from; production starts one above
    #[arg(long, default_value_t = 0)]
    start_height: u64,

    /// Number of in-process validators
    #[arg(long, default_value_t = 4)]
    validator_count: usize,

    /// Voting power per validator
    #[arg(long, default_value_t = 100)]
    stake: u64,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info,quorus=debug")]
    log_level: String,
}

fn committee(count: usize, stake: u64) -> Arc<ValidatorSet> {
    Arc::new(ValidatorSet::new((0..count).map(|i| {
        Validator::new(
            Address::from_public_key(format!("validator-{i}").as_bytes()),
            stake,
        )
    })))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli.log_level)?;

    let config = ConsensusConfig {
        start_height: cli.start_height,
        block_time_ms: cli.block_time_ms,
        ..ConsensusConfig::default()
    };
    let validators = committee(cli.validator_count, cli.stake);
    info!(
        validators = validators.len(),
        total_power = %validators.total_power(),
        block_time_ms = config.block_time_ms,
        "starting node"
    );

    let (coordinator, handle) = Coordinator::new(
        config,
        validators,
        Arc::new(NodeCrypto),
        Box::new(HonestVoteSource),
    );

    let server = RpcServer::new(
        RpcServerConfig {
            listen_addr: cli.listen,
        },
        handle.rpc_state(),
    );
    let server_handle = server.start().await?;

    let coordinator_task = tokio::spawn(coordinator.run());
    handle.start().await?;

    signal::ctrl_c().await?;
    info!("shutdown signal received");

    handle.shutdown().await?;
    let _ = coordinator_task.await;
    server_handle.abort();
    Ok(())
}
