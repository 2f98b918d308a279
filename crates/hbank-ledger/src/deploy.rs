//! Deploy token, oracle and bank together.
//!
//! Deployment order is fixed: token, oracle, bank, then the deployer (the
//! token's initial minter) hands the minter role to the bank. Contract
//! addresses derive from the deployer and that order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hbank_oracle::{PriceFeedOracle, RateSource, StalenessPolicy, STALENESS_THRESHOLD};
use hbank_token::HamToken;
use hbank_types::{shared, Address, Host, Shared};

use crate::bank::HBank;
use crate::interest::RewardPolicy;
use crate::{LedgerError, Result};

/// Yearly return rate the stock deployment uses.
pub const DEFAULT_YEARLY_RETURN_RATE: u64 = 10;

/// Deployment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Yearly return rate of the bank, percent.
    #[serde(default = "default_yearly_return_rate")]
    pub yearly_return_rate: u64,
    /// Blocks after which the oracle rate is stale.
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold: u64,
    #[serde(default)]
    pub reward_policy: RewardPolicy,
}

fn default_yearly_return_rate() -> u64 {
    DEFAULT_YEARLY_RETURN_RATE
}

fn default_staleness_threshold() -> u64 {
    STALENESS_THRESHOLD
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            yearly_return_rate: default_yearly_return_rate(),
            staleness_threshold: default_staleness_threshold(),
            reward_policy: RewardPolicy::default(),
        }
    }
}

/// The three deployed contracts.
#[derive(Clone)]
pub struct Deployment {
    pub deployer: Address,
    pub token: Shared<HamToken>,
    pub oracle: Shared<PriceFeedOracle>,
    pub bank: Shared<HBank>,
}

impl Deployment {
    /// Deploy everything from `deployer` and make the bank the HAM minter.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidConfig`] if the yearly rate is out of range
    /// - [`LedgerError::InvalidPolicy`] if the reward policy is invalid
    pub fn deploy(
        deployer: Address,
        config: &DeployConfig,
        host: Host,
        source: Arc<dyn RateSource>,
    ) -> Result<Self> {
        let token = HamToken::new(Address::contract(&deployer, 0), deployer);
        let oracle = PriceFeedOracle::new(
            Address::contract(&deployer, 1),
            deployer,
            host.clock.clone(),
            source,
        )
        .with_staleness(StalenessPolicy::with_threshold(config.staleness_threshold));

        let token = shared(token);
        let oracle = shared(oracle);
        let bank = HBank::new(
            Address::contract(&deployer, 2),
            token.clone(),
            config.yearly_return_rate,
            oracle.clone(),
            host,
        )?
        .with_policy(config.reward_policy)?;
        let bank_address = bank.address();

        token
            .lock()
            .map_err(|_| LedgerError::LockPoisoned("token"))?
            .pass_minter_role(&deployer, bank_address)?;

        tracing::info!(
            %deployer,
            token = %Address::contract(&deployer, 0),
            oracle = %Address::contract(&deployer, 1),
            bank = %bank_address,
            "deployment complete"
        );
        Ok(Self {
            deployer,
            token,
            oracle,
            bank: shared(bank),
        })
    }
}
