//! Per-account deposit record.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use hbank_types::{Tick, Wei};

/// An account's deposit. The zero value is the inactive state.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub has_active_deposit: bool,
    /// Principal in wei.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Wei,
    /// Tick the deposit was opened at.
    pub start_time: Tick,
}

impl Position {
    /// An active position of `amount` opened at `start_time`.
    pub fn open(amount: Wei, start_time: Tick) -> Self {
        Self {
            has_active_deposit: true,
            amount,
            start_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.has_active_deposit
    }

    /// `has_active_deposit` holds exactly when both `amount` and `start_time`
    /// are non-zero.
    pub fn is_consistent(&self) -> bool {
        self.has_active_deposit == (self.amount > 0 && self.start_time > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive_and_consistent() {
        let p = Position::default();
        assert!(!p.is_active());
        assert_eq!(p.amount, 0);
        assert_eq!(p.start_time, 0);
        assert!(p.is_consistent());
    }

    #[test]
    fn test_open() {
        let p = Position::open(5, 3);
        assert!(p.is_active());
        assert!(p.is_consistent());
    }

    #[test]
    fn test_inconsistent_states_detected() {
        let p = Position {
            has_active_deposit: true,
            amount: 0,
            start_time: 1,
        };
        assert!(!p.is_consistent());
        let p = Position {
            has_active_deposit: false,
            amount: 1,
            start_time: 1,
        };
        assert!(!p.is_consistent());
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let json = serde_json::to_value(Position::open(1_000_000_000_000_000_000, 2))
            .expect("serialize");
        assert_eq!(json["amount"], "1000000000000000000");
        assert_eq!(json["has_active_deposit"], true);
        assert_eq!(json["start_time"], 2);
    }
}
