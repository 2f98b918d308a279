//! # hbank-token
//!
//! The HAM reward token paid out as interest by the bank.
//!
//! HAM is a plain mintable balance ledger with exactly one privileged
//! minter. The minter starts as the deployer and is handed over to the bank
//! at deployment time so that interest can be minted on withdrawal.
//!
//! ## Modules
//!
//! - [`ham`]: Balance ledger and minter role

use hbank_types::{Address, TokenAmount};

pub mod ham;

pub use ham::{HamToken, TokenInfo, DECIMALS, NAME, SYMBOL};

/// Error types for token operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The caller is not the current minter.
    #[error("You are not the minter")]
    Unauthorized,

    /// Minting would overflow a balance or the total supply.
    #[error("mint of {amount} to {to} overflows")]
    Overflow {
        /// Recipient of the mint.
        to: Address,
        /// Requested amount.
        amount: TokenAmount,
    },
}

/// Convenience result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;
