//! Native-currency balance book.
//!
//! Stands in for the host chain's own accounting of Ether. Contracts that
//! take custody of native value (the bank) hold it under their own address
//! in this book.

use std::collections::HashMap;

use crate::{Address, Wei};

/// Error types for native-currency movements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    /// The sending account does not hold enough wei.
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// The sending account.
        account: Address,
        /// Amount requested.
        required: Wei,
        /// Amount held.
        available: Wei,
    },

    /// Crediting the receiver would overflow its balance.
    #[error("native balance overflow for {0}")]
    Overflow(Address),
}

/// Convenience result type for native-currency operations.
pub type Result<T> = std::result::Result<T, NativeError>;

/// Native balances per account.
#[derive(Debug, Clone, Default)]
pub struct NativeBalances {
    balances: HashMap<Address, Wei>,
}

impl NativeBalances {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account`; zero for unknown accounts.
    pub fn balance_of(&self, account: &Address) -> Wei {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Create `amount` wei in `account` (genesis allocation / faucet).
    ///
    /// # Errors
    ///
    /// - [`NativeError::Overflow`] if the balance would overflow
    pub fn credit(&mut self, account: Address, amount: Wei) -> Result<Wei> {
        let balance = self
            .balance_of(&account)
            .checked_add(amount)
            .ok_or(NativeError::Overflow(account))?;
        self.balances.insert(account, balance);
        Ok(balance)
    }

    /// Check that [`transfer`](Self::transfer) would succeed without moving
    /// anything.
    ///
    /// # Errors
    ///
    /// - [`NativeError::InsufficientFunds`] if `from` holds less than `amount`
    /// - [`NativeError::Overflow`] if `to` would overflow
    pub fn check_transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(NativeError::InsufficientFunds {
                account: *from,
                required: amount,
                available,
            });
        }
        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(NativeError::Overflow(*to))?;
        }
        Ok(())
    }

    /// Move `amount` wei from `from` to `to`. Nothing moves on error.
    ///
    /// # Errors
    ///
    /// See [`check_transfer`](Self::check_transfer).
    pub fn transfer(&mut self, from: Address, to: Address, amount: Wei) -> Result<()> {
        self.check_transfer(&from, &to, amount)?;
        if from == to || amount == 0 {
            return Ok(());
        }
        let from_balance = self.balance_of(&from) - amount;
        let to_balance = self.balance_of(&to) + amount;
        self.balances.insert(from, from_balance);
        self.balances.insert(to, to_balance);
        tracing::trace!(%from, %to, amount = %amount, "native transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WEI_PER_ETHER;

    #[test]
    fn test_unknown_account_is_zero() {
        let book = NativeBalances::new();
        assert_eq!(book.balance_of(&Address::from_index(1)), 0);
    }

    #[test]
    fn test_credit_and_transfer() {
        let mut book = NativeBalances::new();
        let a = Address::from_index(1);
        let b = Address::from_index(2);
        book.credit(a, 5 * WEI_PER_ETHER).expect("credit");
        book.transfer(a, b, 2 * WEI_PER_ETHER).expect("transfer");
        assert_eq!(book.balance_of(&a), 3 * WEI_PER_ETHER);
        assert_eq!(book.balance_of(&b), 2 * WEI_PER_ETHER);
    }

    #[test]
    fn test_insufficient_funds_moves_nothing() {
        let mut book = NativeBalances::new();
        let a = Address::from_index(1);
        let b = Address::from_index(2);
        book.credit(a, 1).expect("credit");
        let err = book.transfer(a, b, 2).expect_err("should fail");
        assert_eq!(
            err,
            NativeError::InsufficientFunds {
                account: a,
                required: 2,
                available: 1,
            }
        );
        assert_eq!(book.balance_of(&a), 1);
        assert_eq!(book.balance_of(&b), 0);
    }

    #[test]
    fn test_credit_overflow() {
        let mut book = NativeBalances::new();
        let a = Address::from_index(1);
        book.credit(a, Wei::MAX).expect("credit");
        assert_eq!(book.credit(a, 1), Err(NativeError::Overflow(a)));
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut book = NativeBalances::new();
        let a = Address::from_index(1);
        book.credit(a, 10).expect("credit");
        book.transfer(a, a, 10).expect("self transfer");
        assert_eq!(book.balance_of(&a), 10);
    }
}
