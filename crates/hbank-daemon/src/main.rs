//! hbank-daemon: local chain hosting the HAM token, the ETH/HAM oracle and
//! the bank.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! contracts via JSON-RPC over a Unix socket.

mod chain;
mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info};

use hbank_ledger::Deployment;
use hbank_oracle::StubRateSource;

use crate::chain::Chain;
use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Configuration.
    pub config: DaemonConfig,
    /// Clock, native balances and dev accounts.
    pub chain: Chain,
    /// Deployed token, oracle and bank.
    pub deployment: Deployment,
    /// Source the oracle refreshes from.
    pub rate_source: Arc<StubRateSource>,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl DaemonState {
    /// Start the chain and deploy the contracts from the first dev account.
    pub fn new(config: DaemonConfig) -> anyhow::Result<Self> {
        let chain = Chain::new(&config.chain)?;
        let rate_source = Arc::new(StubRateSource::with_rate(config.oracle.stub_rate));
        let deployment = Deployment::deploy(
            chain.deployer(),
            &config.deploy_config(),
            chain.host(),
            rate_source.clone(),
        )?;
        let event_bus = EventBus::new(config.rpc.event_buffer);
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            chain,
            deployment,
            rate_source,
            event_bus,
            shutdown_tx,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hbank=info".parse()?),
        )
        .init();

    info!("HBank daemon starting");

    // 1. Load config
    let config = DaemonConfig::load()?;
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Start the chain and deploy token, oracle and bank
    let state = Arc::new(DaemonState::new(config)?);
    let shutdown_tx = state.shutdown_tx.clone();

    // 3. Produce blocks
    let interval_ms = state.config.chain.block_interval_ms;
    let producer = if interval_ms > 0 {
        Some(tokio::spawn(chain::run_block_producer(
            state.chain.clock().clone(),
            Duration::from_millis(interval_ms),
            shutdown_tx.subscribe(),
        )))
    } else {
        info!("block producer disabled; mine with chain_mine");
        None
    };

    // 4. Start IPC server
    let socket_path = state.config.socket_path();
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    // 5. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");
    let _ = shutdown_tx.send(());
    if let Some(producer) = producer {
        let _ = producer.await;
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
