//! Reward formula.
//!
//! Simple (non-compounding) interest on the principal, converted into HAM
//! through the oracle rate:
//!
//! ```text
//! Multiply: reward = amount * yearly_rate * elapsed * oracle_rate / (100 * ticks_per_year)
//! Divide:   reward = amount * yearly_rate * elapsed / (100 * ticks_per_year * oracle_rate)
//! ```
//!
//! All multiplications happen before the single division, in `u128`, and the
//! result is rounded down. An oracle that has never been priced reports 0;
//! that rate is priced at [`UNSET_ORACLE_RATE`] (1:1) in both modes.

use serde::{Deserialize, Serialize};

use hbank_types::{TokenAmount, Wei};

use crate::{LedgerError, Result};

/// Ticks in a year when one tick is one second (365 days).
pub const TICKS_PER_YEAR: u64 = 31_536_000;

/// Rate used in place of an oracle rate of 0.
pub const UNSET_ORACLE_RATE: u64 = 1;

/// How the oracle rate enters the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleRateMode {
    /// Rate is HAM per ETH: multiply.
    #[default]
    Multiply,
    /// Rate is ETH per HAM: divide.
    Divide,
}

/// Parameters of the reward formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    /// Ticks that make up one year of accrual.
    #[serde(default = "default_ticks_per_year")]
    pub ticks_per_year: u64,
    #[serde(default)]
    pub rate_mode: OracleRateMode,
}

fn default_ticks_per_year() -> u64 {
    TICKS_PER_YEAR
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            ticks_per_year: default_ticks_per_year(),
            rate_mode: OracleRateMode::default(),
        }
    }
}

impl RewardPolicy {
    /// Reject policies the formula cannot evaluate.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidPolicy`] if `ticks_per_year` is zero
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_year == 0 {
            return Err(LedgerError::InvalidPolicy(
                "ticks_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// HAM owed on `amount` wei held for `elapsed` ticks.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] if an intermediate product overflows `u128`
    /// - [`LedgerError::InvalidPolicy`] if the policy is invalid
    pub fn reward(
        &self,
        amount: Wei,
        yearly_return_rate: u64,
        elapsed: u64,
        oracle_rate: u64,
    ) -> Result<TokenAmount> {
        self.validate()?;

        let interest = amount
            .checked_mul(u128::from(yearly_return_rate))
            .and_then(|v| v.checked_mul(u128::from(elapsed)))
            .ok_or(LedgerError::Overflow)?;
        let year = 100u128 * u128::from(self.ticks_per_year);
        let priced_rate = if oracle_rate == 0 {
            tracing::debug!("oracle rate unset; pricing 1:1");
            UNSET_ORACLE_RATE
        } else {
            oracle_rate
        };

        let reward = match self.rate_mode {
            OracleRateMode::Multiply => interest
                .checked_mul(u128::from(priced_rate))
                .ok_or(LedgerError::Overflow)?
                / year,
            OracleRateMode::Divide => {
                let denominator = year
                    .checked_mul(u128::from(priced_rate))
                    .ok_or(LedgerError::Overflow)?;
                interest / denominator
            }
        };

        tracing::trace!(
            amount = %amount,
            yearly_return_rate,
            elapsed,
            oracle_rate,
            reward = %reward,
            "reward computed"
        );
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbank_types::WEI_PER_ETHER;

    #[test]
    fn test_full_year_at_unit_rate() {
        let policy = RewardPolicy::default();
        let reward = policy
            .reward(WEI_PER_ETHER, 10, TICKS_PER_YEAR, 1)
            .expect("reward");
        // 10% of 1 ETH
        assert_eq!(reward, WEI_PER_ETHER / 10);
    }

    #[test]
    fn test_oracle_rate_multiplies() {
        let policy = RewardPolicy::default();
        let base = policy
            .reward(WEI_PER_ETHER, 10, TICKS_PER_YEAR / 10, 1)
            .expect("reward");
        let priced = policy
            .reward(WEI_PER_ETHER, 10, TICKS_PER_YEAR / 10, 100)
            .expect("reward");
        assert_eq!(base, WEI_PER_ETHER / 100);
        assert_eq!(priced, base * 100);
    }

    #[test]
    fn test_divide_mode() {
        let policy = RewardPolicy {
            rate_mode: OracleRateMode::Divide,
            ..RewardPolicy::default()
        };
        let reward = policy
            .reward(WEI_PER_ETHER, 10, TICKS_PER_YEAR, 4)
            .expect("reward");
        assert_eq!(reward, WEI_PER_ETHER / 40);
    }

    #[test]
    fn test_unset_oracle_rate_prices_one_to_one() {
        for rate_mode in [OracleRateMode::Multiply, OracleRateMode::Divide] {
            let policy = RewardPolicy {
                rate_mode,
                ..RewardPolicy::default()
            };
            let unset = policy.reward(WEI_PER_ETHER, 10, 2, 0).expect("reward");
            let unit = policy.reward(WEI_PER_ETHER, 10, 2, 1).expect("reward");
            assert!(unset > 0, "{rate_mode:?} must pay for elapsed ticks");
            assert_eq!(unset, unit);
        }
    }

    #[test]
    fn test_zero_elapsed_pays_nothing() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.reward(WEI_PER_ETHER, 100, 0, 100).expect("reward"), 0);
    }

    #[test]
    fn test_short_hold_is_positive() {
        let policy = RewardPolicy::default();
        let reward = policy.reward(WEI_PER_ETHER, 10, 5, 100).expect("reward");
        assert!(reward > 0);
    }

    #[test]
    fn test_rounds_down() {
        let policy = RewardPolicy {
            ticks_per_year: 3,
            rate_mode: OracleRateMode::Multiply,
        };
        // 10 * 10 * 1 * 1 / 300 = 0.33..
        assert_eq!(policy.reward(10, 10, 1, 1).expect("reward"), 0);
        // 100 * 10 * 1 * 1 / 300 = 3.33..
        assert_eq!(policy.reward(100, 10, 1, 1).expect("reward"), 3);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let policy = RewardPolicy::default();
        let err = policy
            .reward(Wei::MAX / 2, 100, u64::MAX, u64::MAX)
            .expect_err("overflow");
        assert_eq!(err, LedgerError::Overflow);
    }

    #[test]
    fn test_zero_ticks_per_year_rejected() {
        let policy = RewardPolicy {
            ticks_per_year: 0,
            rate_mode: OracleRateMode::Multiply,
        };
        assert!(matches!(
            policy.reward(1, 1, 1, 1),
            Err(LedgerError::InvalidPolicy(_))
        ));
    }
}
