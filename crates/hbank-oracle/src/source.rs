//! Rate sources consulted when the cached rate goes stale.
//!
//! No external price feed is wired in. [`StubRateSource`] returns a
//! hardcoded ETH/HAM rate that can be adjusted for development and testing
//! via [`dev_set_rate`](StubRateSource::dev_set_rate).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hbank_types::Tick;

use crate::Result;

/// Default rate: 1 ETH = 100 HAM.
pub const DEFAULT_RATE: u64 = 100;

/// Something the oracle can ask for a fresh rate.
pub trait RateSource: Send + Sync {
    /// Produce the current rate for `price_feed` (e.g. `"ETH/HAM"`) at `tick`.
    fn fetch_rate(&self, price_feed: &str, tick: Tick) -> Result<u64>;
}

impl<S: RateSource + ?Sized> RateSource for Arc<S> {
    fn fetch_rate(&self, price_feed: &str, tick: Tick) -> Result<u64> {
        (**self).fetch_rate(price_feed, tick)
    }
}

/// A rate source that returns a hardcoded exchange rate.
#[derive(Debug)]
pub struct StubRateSource {
    rate: AtomicU64,
}

impl StubRateSource {
    /// Create a stub source with the default rate.
    pub fn new() -> Self {
        Self::with_rate(DEFAULT_RATE)
    }

    /// Create a stub source with a custom rate.
    pub fn with_rate(rate: u64) -> Self {
        Self {
            rate: AtomicU64::new(rate),
        }
    }

    /// The rate the next refresh will pick up.
    pub fn current_rate(&self) -> u64 {
        self.rate.load(Ordering::SeqCst)
    }

    /// Set the rate (development/testing only).
    pub fn dev_set_rate(&self, rate: u64) {
        tracing::warn!(new_rate = rate, "stub rate source: rate changed (dev only)");
        self.rate.store(rate, Ordering::SeqCst);
    }
}

impl Default for StubRateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RateSource for StubRateSource {
    fn fetch_rate(&self, price_feed: &str, tick: Tick) -> Result<u64> {
        let rate = self.current_rate();
        tracing::debug!(price_feed, tick, rate, "stub rate source queried");
        Ok(rate)
    }
}
