//! HAM balance ledger and minter role.
//!
//! Only the current minter may mint or hand the role to someone else. Once
//! the role is passed on, the previous minter has no remaining authority.

use std::collections::HashMap;

use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};

use hbank_types::{Address, TokenAmount};

use crate::{Result, TokenError};

/// Token name.
pub const NAME: &str = "HAM TOKEN";

/// Token symbol.
pub const SYMBOL: &str = "HAM";

/// Number of decimals in a display unit.
pub const DECIMALS: u8 = 18;

/// Static metadata plus supply figures, as served to clients.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    #[serde_as(as = "DisplayFromStr")]
    pub total_supply: TokenAmount,
    pub minter: Address,
}

/// The HAM token.
#[derive(Debug, Clone)]
pub struct HamToken {
    /// Address the token is deployed at.
    address: Address,
    /// Account currently allowed to mint and to pass the role on.
    minter: Address,
    balances: HashMap<Address, TokenAmount>,
    total_supply: TokenAmount,
}

impl HamToken {
    /// Deploy a token at `address`. The creator becomes the minter.
    pub fn new(address: Address, creator: Address) -> Self {
        tracing::info!(%address, minter = %creator, "HAM token deployed");
        Self {
            address,
            minter: creator,
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Address the token is deployed at.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The current minter.
    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn name(&self) -> &'static str {
        NAME
    }

    pub fn symbol(&self) -> &'static str {
        SYMBOL
    }

    pub fn decimals(&self) -> u8 {
        DECIMALS
    }

    /// Sum of every balance ever minted.
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Balance of `account`; zero for accounts that never received HAM.
    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Snapshot of metadata and supply.
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            address: self.address,
            name: NAME,
            symbol: SYMBOL,
            decimals: DECIMALS,
            total_supply: self.total_supply,
            minter: self.minter,
        }
    }

    fn ensure_minter(&self, caller: &Address) -> Result<()> {
        if *caller != self.minter {
            tracing::warn!(%caller, minter = %self.minter, "rejected call from non-minter");
            return Err(TokenError::Unauthorized);
        }
        Ok(())
    }

    /// Validate a mint without applying it. Returns the recipient's balance
    /// and the total supply as they would be after the mint.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Unauthorized`] if `caller` is not the minter
    /// - [`TokenError::Overflow`] if the balance or total supply would overflow
    pub fn check_mint(
        &self,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(TokenAmount, TokenAmount)> {
        self.ensure_minter(caller)?;
        let overflow = || TokenError::Overflow { to: *to, amount };
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(overflow)?;
        Ok((balance, supply))
    }

    /// Mint `amount` to `to`. Returns the recipient's new balance.
    ///
    /// # Errors
    ///
    /// See [`check_mint`](Self::check_mint). Nothing changes on error.
    pub fn mint(&mut self, caller: &Address, to: Address, amount: TokenAmount) -> Result<TokenAmount> {
        let (balance, supply) = self.check_mint(caller, &to, amount)?;
        self.balances.insert(to, balance);
        self.total_supply = supply;
        tracing::debug!(%to, amount = %amount, balance = %balance, "HAM minted");
        Ok(balance)
    }

    /// Hand the minter role to `new_minter`. Effective immediately.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Unauthorized`] if `caller` is not the minter
    pub fn pass_minter_role(&mut self, caller: &Address, new_minter: Address) -> Result<()> {
        self.ensure_minter(caller)?;
        let previous = std::mem::replace(&mut self.minter, new_minter);
        tracing::info!(%previous, %new_minter, "HAM minter role passed");
        Ok(())
    }
}
