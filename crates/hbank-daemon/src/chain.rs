//! Local chain: block clock, dev accounts and the block producer.
//!
//! Blocks carry no transactions; producing one only advances the tick every
//! contract reads its time from.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing::{debug, info};

use hbank_types::{
    shared, Address, BlockClock, Clock, Host, NativeBalances, Shared, Tick, WEI_PER_ETHER,
};

use crate::config::ChainConfig;

/// Clock, native balances and the funded dev accounts.
pub struct Chain {
    clock: Arc<BlockClock>,
    native: Shared<NativeBalances>,
    accounts: Vec<Address>,
    deployer: Address,
}

impl Chain {
    /// Start a chain at the configured genesis block and fund the dev
    /// accounts.
    pub fn new(config: &ChainConfig) -> anyhow::Result<Self> {
        let balance = u128::from(config.dev_account_balance_eth)
            .checked_mul(WEI_PER_ETHER)
            .context("dev account balance overflows")?;

        let mut book = NativeBalances::new();
        let accounts: Vec<Address> = (0..config.dev_accounts).map(Address::from_index).collect();
        let deployer = *accounts
            .first()
            .context("at least one dev account is required")?;
        for account in &accounts {
            book.credit(*account, balance)?;
        }

        info!(
            genesis = config.genesis_block,
            accounts = accounts.len(),
            balance_eth = config.dev_account_balance_eth,
            "chain initialized"
        );
        Ok(Self {
            clock: Arc::new(BlockClock::new(config.genesis_block)),
            native: shared(book),
            accounts,
            deployer,
        })
    }

    /// Clock and native book handed to every contract.
    pub fn host(&self) -> Host {
        Host::new(self.clock.clone(), self.native.clone())
    }

    pub fn clock(&self) -> &Arc<BlockClock> {
        &self.clock
    }

    pub fn native(&self) -> &Shared<NativeBalances> {
        &self.native
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Account that deploys the contracts.
    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn block_number(&self) -> Tick {
        self.clock.current_tick()
    }
}

/// Mine one block every `interval` until shutdown.
pub async fn run_block_producer(
    clock: Arc<BlockClock>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;
    info!(?interval, "block producer started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let block = clock.mine();
                debug!(block, "block produced");
            }
            _ = shutdown_rx.recv() => {
                info!("block producer stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_accounts_funded() {
        let chain = Chain::new(&ChainConfig::default()).expect("chain");
        assert_eq!(chain.accounts().len(), 10);
        assert_eq!(chain.block_number(), 1);
        let book = chain.native().lock().expect("lock");
        for account in chain.accounts() {
            assert_eq!(book.balance_of(account), 100 * WEI_PER_ETHER);
        }
    }

    #[test]
    fn test_no_accounts_rejected() {
        let config = ChainConfig {
            dev_accounts: 0,
            ..ChainConfig::default()
        };
        assert!(Chain::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_block_producer_mines_until_shutdown() {
        let clock = Arc::new(BlockClock::new(1));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let producer = tokio::spawn(run_block_producer(
            clock.clone(),
            Duration::from_millis(10),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).expect("send shutdown");
        producer.await.expect("producer task");

        let mined = clock.current_tick();
        assert!(mined > 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(clock.current_tick(), mined);
    }
}
