//! Staleness policy for the cached rate.
//!
//! A rate is stale once strictly more than [`STALENESS_THRESHOLD`] ticks have
//! elapsed since it was last set. Exactly `threshold` ticks is still fresh.

use hbank_types::Tick;

use crate::{OracleError, Result};

/// Staleness threshold in ticks.
pub const STALENESS_THRESHOLD: u64 = 3;

/// Decides when the cached rate must be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    threshold: u64,
}

impl StalenessPolicy {
    /// Policy with the default threshold.
    pub fn new() -> Self {
        Self {
            threshold: STALENESS_THRESHOLD,
        }
    }

    /// Policy with a custom threshold.
    pub fn with_threshold(threshold: u64) -> Self {
        Self { threshold }
    }

    /// Ticks elapsed between `last_update` and `current`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::ClockRegressed`] if `current` is before `last_update`
    pub fn elapsed(&self, last_update: Tick, current: Tick) -> Result<u64> {
        current
            .checked_sub(last_update)
            .ok_or(OracleError::ClockRegressed {
                last_update,
                current,
            })
    }

    /// Whether a rate set at `last_update` is stale at `current`.
    pub fn is_stale(&self, last_update: Tick, current: Tick) -> Result<bool> {
        Ok(self.elapsed(last_update, current)? > self.threshold)
    }

    /// The configured threshold.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::new()
    }
}
