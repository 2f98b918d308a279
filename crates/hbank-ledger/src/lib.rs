//! # hbank-ledger
//!
//! The bank: one native-currency deposit per account, paid back with HAM
//! interest on withdrawal.
//!
//! Interest accrues linearly with elapsed ticks at a fixed yearly rate and is
//! priced through the ETH/HAM oracle. The bank must hold the HAM minter role
//! to pay interest; [`deploy`] wires that up the same way the production
//! deployment does.
//!
//! ## Modules
//!
//! - [`bank`]: Deposit/withdraw state machine
//! - [`position`]: Per-account deposit record
//! - [`interest`]: Reward formula and rounding policy
//! - [`deploy`]: Deploy token, oracle and bank together

pub mod bank;
pub mod deploy;
pub mod interest;
pub mod position;

pub use bank::{
    DepositReceipt, HBank, WithdrawReceipt, MAX_YEARLY_RETURN_RATE, MIN_DEPOSIT,
    MIN_YEARLY_RETURN_RATE,
};
pub use deploy::{DeployConfig, Deployment, DEFAULT_YEARLY_RETURN_RATE};
pub use interest::{OracleRateMode, RewardPolicy, TICKS_PER_YEAR, UNSET_ORACLE_RATE};
pub use position::Position;

use hbank_oracle::OracleError;
use hbank_token::TokenError;
use hbank_types::{NativeError, Tick};

/// Error types for bank operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Yearly return rate outside `[1, 100]`.
    #[error("Yearly return rate must be between 1 and 100")]
    InvalidConfig,

    /// Deposit below one Ether.
    #[error("Minimum deposit amount is 1 Ether")]
    InvalidAmount,

    /// The account already has an active deposit.
    #[error("Account can't have multiple active deposits")]
    DuplicateActivePosition,

    /// The account has nothing to withdraw.
    #[error("Account must have an active deposit to withdraw")]
    NoActivePosition,

    /// Reward policy parameters are unusable.
    #[error("invalid reward policy: {0}")]
    InvalidPolicy(String),

    /// Arithmetic overflow in the reward calculation.
    #[error("arithmetic overflow in reward calculation")]
    Overflow,

    /// The clock is at the genesis tick, which cannot stamp a deposit.
    #[error("cannot open a deposit at genesis tick 0")]
    GenesisTick,

    /// The clock reports a tick before the deposit's start.
    #[error("clock went backwards: deposit started at {start}, current {current}")]
    ClockRegressed {
        /// Tick the deposit was opened at.
        start: Tick,
        /// Tick reported by the clock.
        current: Tick,
    },

    /// A component mutex was poisoned by a panicking holder.
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Native(#[from] NativeError),
}

/// Convenience result type for bank operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
