//! Deposit/withdraw state machine.
//!
//! Each account is either without a position or holds exactly one active
//! [`Position`]. `deposit` opens one, `withdraw` closes it and pays the
//! principal back in wei plus interest in freshly minted HAM.
//!
//! Withdrawal touches three other components (oracle, token, native book).
//! Every effect is validated against all three while their locks are held,
//! and only then committed, so a failed withdrawal leaves no trace anywhere.
//! Locks are always taken in the order oracle, token, native book.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};

use hbank_oracle::PriceFeedOracle;
use hbank_token::HamToken;
use hbank_types::{
    Address, Clock, Event, EventType, Host, NativeBalances, Shared, Tick, TokenAmount, Wei,
    WEI_PER_ETHER,
};

use crate::interest::RewardPolicy;
use crate::position::Position;
use crate::{LedgerError, Result};

/// Smallest accepted deposit: one Ether.
pub const MIN_DEPOSIT: Wei = WEI_PER_ETHER;

/// Lowest accepted yearly return rate, in percent.
pub const MIN_YEARLY_RETURN_RATE: u64 = 1;

/// Highest accepted yearly return rate, in percent.
pub const MAX_YEARLY_RETURN_RATE: u64 = 100;

/// Outcome of a successful deposit.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositReceipt {
    pub account: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Wei,
    pub start_time: Tick,
    pub events: Vec<Event>,
}

/// Outcome of a successful withdrawal.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawReceipt {
    pub account: Address,
    /// Wei returned to the account.
    #[serde_as(as = "DisplayFromStr")]
    pub principal: Wei,
    /// HAM minted to the account.
    #[serde_as(as = "DisplayFromStr")]
    pub reward: TokenAmount,
    /// Oracle rate the reward was priced at.
    pub rate: u64,
    /// Ticks the deposit was held.
    pub elapsed: u64,
    /// Events emitted during the call, in order.
    pub events: Vec<Event>,
}

/// The bank.
pub struct HBank {
    address: Address,
    yearly_return_rate: u64,
    token: Shared<HamToken>,
    oracle: Shared<PriceFeedOracle>,
    native: Shared<NativeBalances>,
    clock: Arc<dyn Clock>,
    policy: RewardPolicy,
    investors: HashMap<Address, Position>,
}

impl std::fmt::Debug for HBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HBank")
            .field("address", &self.address)
            .field("yearly_return_rate", &self.yearly_return_rate)
            .field("policy", &self.policy)
            .field("investors", &self.investors.len())
            .finish_non_exhaustive()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &'static str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| LedgerError::LockPoisoned(what))
}

impl HBank {
    /// Deploy a bank at `address` paying `yearly_return_rate` percent a year.
    ///
    /// The bank does not become the token minter by itself; the current
    /// minter has to pass the role on before the first withdrawal.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidConfig`] if the rate is outside `[1, 100]`
    pub fn new(
        address: Address,
        token: Shared<HamToken>,
        yearly_return_rate: u64,
        oracle: Shared<PriceFeedOracle>,
        host: Host,
    ) -> Result<Self> {
        if !(MIN_YEARLY_RETURN_RATE..=MAX_YEARLY_RETURN_RATE).contains(&yearly_return_rate) {
            return Err(LedgerError::InvalidConfig);
        }
        tracing::info!(%address, yearly_return_rate, "bank deployed");
        Ok(Self {
            address,
            yearly_return_rate,
            token,
            oracle,
            native: host.native,
            clock: host.clock,
            policy: RewardPolicy::default(),
            investors: HashMap::new(),
        })
    }

    /// Replace the reward policy.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidPolicy`] if the policy is invalid
    pub fn with_policy(mut self, policy: RewardPolicy) -> Result<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    /// Address the bank is deployed at; also its custody account and its
    /// identity towards the token.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn yearly_return_rate(&self) -> u64 {
        self.yearly_return_rate
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    pub fn token(&self) -> &Shared<HamToken> {
        &self.token
    }

    pub fn oracle(&self) -> &Shared<PriceFeedOracle> {
        &self.oracle
    }

    /// Position of `account`; the inactive zero value if it never deposited.
    pub fn investor(&self, account: &Address) -> Position {
        self.investors.get(account).copied().unwrap_or_default()
    }

    /// Number of accounts with an active deposit.
    pub fn active_positions(&self) -> usize {
        self.investors.values().filter(|p| p.is_active()).count()
    }

    /// Wei currently held in the bank's custody.
    pub fn custody_balance(&self) -> Result<Wei> {
        Ok(lock(&self.native, "native")?.balance_of(&self.address))
    }

    /// Open a position of `value` wei for `caller`. The wei moves from the
    /// caller's native balance into the bank's custody.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `value` is below one Ether
    /// - [`LedgerError::DuplicateActivePosition`] if `caller` already has a position
    /// - [`LedgerError::GenesisTick`] if the clock is still at tick 0
    /// - [`LedgerError::Native`] if the caller cannot fund the deposit
    pub fn deposit(&mut self, caller: Address, value: Wei) -> Result<DepositReceipt> {
        if value < MIN_DEPOSIT {
            return Err(LedgerError::InvalidAmount);
        }
        if self.investor(&caller).is_active() {
            return Err(LedgerError::DuplicateActivePosition);
        }
        let start_time = self.clock.current_tick();
        if start_time == 0 {
            return Err(LedgerError::GenesisTick);
        }

        lock(&self.native, "native")?.transfer(caller, self.address, value)?;
        self.investors
            .insert(caller, Position::open(value, start_time));

        tracing::info!(account = %caller, amount = %value, block = start_time, "deposit opened");
        let event = Event::new(
            EventType::Deposited,
            self.address,
            start_time,
            serde_json::json!({ "account": caller, "amount": value.to_string() }),
        );
        Ok(DepositReceipt {
            account: caller,
            amount: value,
            start_time,
            events: vec![event],
        })
    }

    /// Close `caller`'s position: mint the accrued HAM reward to the caller,
    /// return the principal, and reset the position. Reading the oracle rate
    /// may refresh it; the refresh is committed together with everything
    /// else.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoActivePosition`] if `caller` has no position
    /// - [`LedgerError::Token`] if the bank is not the minter or the mint overflows
    /// - [`LedgerError::Oracle`] if the rate cannot be read
    /// - [`LedgerError::Native`] if custody cannot cover the principal
    /// - [`LedgerError::Overflow`] if the reward overflows
    pub fn withdraw(&mut self, caller: Address) -> Result<WithdrawReceipt> {
        let position = self.investor(&caller);
        if !position.is_active() {
            return Err(LedgerError::NoActivePosition);
        }

        let mut oracle = lock(&self.oracle, "oracle")?;
        let mut token = lock(&self.token, "token")?;
        let mut native = lock(&self.native, "native")?;

        let now = self.clock.current_tick();
        let elapsed = now
            .checked_sub(position.start_time)
            .ok_or(LedgerError::ClockRegressed {
                start: position.start_time,
                current: now,
            })?;

        // Stage: nothing below mutates until every check has passed.
        let quote = oracle.quote_at(now)?;
        let reward =
            self.policy
                .reward(position.amount, self.yearly_return_rate, elapsed, quote.rate)?;
        token.check_mint(&self.address, &caller, reward)?;
        native.check_transfer(&self.address, &caller, position.amount)?;

        // Commit.
        let reading = oracle.apply(quote)?;
        token.mint(&self.address, caller, reward)?;
        native.transfer(self.address, caller, position.amount)?;
        self.investors.insert(caller, Position::default());

        tracing::info!(
            account = %caller,
            principal = %position.amount,
            reward = %reward,
            rate = reading.rate,
            elapsed,
            "deposit withdrawn"
        );

        let mut events = Vec::with_capacity(2);
        events.extend(reading.event);
        events.push(Event::new(
            EventType::Withdrawn,
            self.address,
            now,
            serde_json::json!({
                "account": caller,
                "principal": position.amount.to_string(),
                "reward": reward.to_string(),
                "rate": reading.rate,
            }),
        ));

        Ok(WithdrawReceipt {
            account: caller,
            principal: position.amount,
            reward,
            rate: reading.rate,
            elapsed,
            events,
        })
    }
}
