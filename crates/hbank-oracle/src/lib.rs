//! # hbank-oracle
//!
//! ETH/HAM exchange-rate oracle.
//!
//! The oracle caches a rate together with the block it was last set at. The
//! owner may force a new rate at any time; anyone reading the rate after it
//! has gone stale triggers a refresh from the configured [`RateSource`] and a
//! `RateRefreshed` event. There is no background updater: refreshes are
//! pulled by readers and rate-limited by the staleness threshold.
//!
//! ## Modules
//!
//! - [`feed`]: The oracle contract
//! - [`staleness`]: Staleness policy
//! - [`source`]: Rate sources consulted on refresh

pub mod feed;
pub mod source;
pub mod staleness;

pub use feed::{PriceFeedOracle, RateQuote, RateReading, PRICE_FEED};
pub use source::{RateSource, StubRateSource, DEFAULT_RATE};
pub use staleness::{StalenessPolicy, STALENESS_THRESHOLD};

use hbank_types::Tick;

/// Error types for oracle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The caller is not the oracle owner.
    #[error("caller is not the owner")]
    Unauthorized,

    /// The clock reports a tick before the last update.
    #[error("clock went backwards: last update {last_update}, current {current}")]
    ClockRegressed {
        /// Tick of the last update.
        last_update: Tick,
        /// Tick reported by the clock.
        current: Tick,
    },

    /// A quote was applied after the oracle state it was computed from changed.
    #[error("quote computed at update {quoted_at} no longer matches update {last_update}")]
    QuoteOutdated {
        /// `last_update_tick` when the quote was computed.
        quoted_at: Tick,
        /// Current `last_update_tick`.
        last_update: Tick,
    },

    /// The rate source failed to produce a rate.
    #[error("rate source failed: {0}")]
    Source(String),
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
