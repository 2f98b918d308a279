//! Integration test crate for HBank.
//!
//! Holds the shared fixture used by the integration tests in `tests/`, which
//! exercise end-to-end flows across the token, oracle and ledger crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p hbank-integration-tests
//! ```

use std::sync::Arc;

use hbank_ledger::{DeployConfig, Deployment, LedgerError};
use hbank_oracle::StubRateSource;
use hbank_types::{
    shared, Address, BlockClock, Host, NativeBalances, Shared, TokenAmount, Wei, WEI_PER_ETHER,
};

/// Native balance each test account starts with.
pub const STARTING_BALANCE: Wei = 100 * WEI_PER_ETHER;

/// A local chain with funded accounts and a complete deployment.
pub struct Harness {
    pub clock: Arc<BlockClock>,
    pub native: Shared<NativeBalances>,
    pub source: Arc<StubRateSource>,
    pub deployment: Deployment,
    /// Funded accounts; `accounts[0]` is the deployer.
    pub accounts: Vec<Address>,
}

impl Harness {
    /// Chain at block 1 with `accounts` funded accounts, deployed with
    /// `config`.
    pub fn new(accounts: u64, config: &DeployConfig) -> Result<Self, LedgerError> {
        let clock = Arc::new(BlockClock::new(1));
        let mut book = NativeBalances::new();
        let accounts: Vec<Address> = (0..accounts.max(1)).map(Address::from_index).collect();
        for account in &accounts {
            book.credit(*account, STARTING_BALANCE)?;
        }
        let native = shared(book);
        let source = Arc::new(StubRateSource::new());
        let deployment = Deployment::deploy(
            accounts[0],
            config,
            Host::new(clock.clone(), native.clone()),
            source.clone(),
        )?;
        Ok(Self {
            clock,
            native,
            source,
            deployment,
            accounts,
        })
    }

    /// Default deployment with ten funded accounts.
    pub fn standard() -> Result<Self, LedgerError> {
        Self::new(10, &DeployConfig::default())
    }

    pub fn native_balance(&self, account: &Address) -> Result<Wei, LedgerError> {
        self.native
            .lock()
            .map(|book| book.balance_of(account))
            .map_err(|_| LedgerError::LockPoisoned("native"))
    }

    pub fn ham_balance(&self, account: &Address) -> Result<TokenAmount, LedgerError> {
        self.deployment
            .token
            .lock()
            .map(|token| token.balance_of(account))
            .map_err(|_| LedgerError::LockPoisoned("token"))
    }
}
