//! The ETH/HAM price feed oracle.
//!
//! Reading the rate is a two-step affair internally: [`quote`] works out what
//! the read would return (and whether it refreshes) without touching state,
//! and [`apply`] commits a quote. [`get_rate`] does both. Contracts that need
//! the rate as part of a larger all-or-nothing operation quote first and
//! apply only once every other effect has been validated.
//!
//! [`quote`]: PriceFeedOracle::quote
//! [`apply`]: PriceFeedOracle::apply
//! [`get_rate`]: PriceFeedOracle::get_rate

use std::sync::Arc;

use serde::Serialize;

use hbank_types::{Address, Clock, Event, EventType, Tick};

use crate::source::RateSource;
use crate::staleness::StalenessPolicy;
use crate::{OracleError, Result};

/// Label of the asset pair this oracle prices.
pub const PRICE_FEED: &str = "ETH/HAM";

/// Outcome of [`PriceFeedOracle::quote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateQuote {
    /// Rate the read returns.
    pub rate: u64,
    /// Tick the quote was computed at.
    pub tick: Tick,
    /// `last_update_tick` the quote was computed against.
    pub quoted_at: Tick,
    /// Whether applying the quote refreshes the oracle.
    pub refresh: bool,
}

/// Result of a committed rate read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateReading {
    pub rate: u64,
    /// `RateRefreshed` event, present only when the read refreshed the rate.
    pub event: Option<Event>,
}

/// Cached exchange rate with owner-forced updates and reader-pulled refreshes.
pub struct PriceFeedOracle {
    address: Address,
    owner: Address,
    rate: u64,
    last_update_tick: Tick,
    staleness: StalenessPolicy,
    source: Arc<dyn RateSource>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PriceFeedOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceFeedOracle")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("rate", &self.rate)
            .field("last_update_tick", &self.last_update_tick)
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

impl PriceFeedOracle {
    /// Deploy an oracle at `address` owned by `owner`. The rate starts at zero
    /// and the last update is the deployment tick.
    pub fn new(
        address: Address,
        owner: Address,
        clock: Arc<dyn Clock>,
        source: Arc<dyn RateSource>,
    ) -> Self {
        let last_update_tick = clock.current_tick();
        tracing::info!(%address, %owner, block = last_update_tick, "ETH/HAM oracle deployed");
        Self {
            address,
            owner,
            rate: 0,
            last_update_tick,
            staleness: StalenessPolicy::new(),
            source,
            clock,
        }
    }

    /// Replace the staleness policy.
    pub fn with_staleness(mut self, staleness: StalenessPolicy) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn price_feed(&self) -> &'static str {
        PRICE_FEED
    }

    /// The cached rate, without any staleness check.
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Tick at which the rate was last set.
    pub fn last_update_tick(&self) -> Tick {
        self.last_update_tick
    }

    pub fn staleness(&self) -> StalenessPolicy {
        self.staleness
    }

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if *caller != self.owner {
            tracing::warn!(%caller, owner = %self.owner, "rejected oracle call from non-owner");
            return Err(OracleError::Unauthorized);
        }
        Ok(())
    }

    /// Current tick, refusing to move backwards past the last update.
    fn now(&self) -> Result<Tick> {
        let current = self.clock.current_tick();
        self.staleness.elapsed(self.last_update_tick, current)?;
        Ok(current)
    }

    /// Force a new rate. Owner only.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unauthorized`] if `caller` is not the owner
    /// - [`OracleError::ClockRegressed`] if the clock is behind the last update
    pub fn update_rate(&mut self, caller: &Address, new_rate: u64) -> Result<Event> {
        self.ensure_owner(caller)?;
        let tick = self.now()?;
        self.rate = new_rate;
        self.last_update_tick = tick;
        tracing::info!(rate = new_rate, block = tick, "oracle rate updated by owner");
        Ok(Event::new(
            EventType::RateUpdated,
            self.address,
            tick,
            serde_json::json!({ "price_feed": PRICE_FEED, "rate": new_rate }),
        ))
    }

    /// Hand ownership to `new_owner`. Owner only.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unauthorized`] if `caller` is not the owner
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<Event> {
        self.ensure_owner(caller)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        tracing::info!(%previous, %new_owner, "oracle ownership transferred");
        Ok(Event::new(
            EventType::OwnershipTransferred,
            self.address,
            self.clock.current_tick(),
            serde_json::json!({ "previous_owner": previous, "new_owner": new_owner }),
        ))
    }

    /// Work out what [`get_rate`](Self::get_rate) would return right now,
    /// consulting the rate source if the cached rate is stale. Does not
    /// mutate the oracle.
    ///
    /// # Errors
    ///
    /// - [`OracleError::ClockRegressed`] if the clock is behind the last update
    /// - [`OracleError::Source`] if the rate source fails
    pub fn quote(&self) -> Result<RateQuote> {
        self.quote_at(self.clock.current_tick())
    }

    /// [`quote`](Self::quote) as of `tick`, for callers that already read
    /// the clock and need the refresh stamped with that same tick.
    ///
    /// # Errors
    ///
    /// See [`quote`](Self::quote).
    pub fn quote_at(&self, tick: Tick) -> Result<RateQuote> {
        self.staleness.elapsed(self.last_update_tick, tick)?;
        let refresh = self.staleness.is_stale(self.last_update_tick, tick)?;
        let rate = if refresh {
            self.source.fetch_rate(PRICE_FEED, tick)?
        } else {
            self.rate
        };
        Ok(RateQuote {
            rate,
            tick,
            quoted_at: self.last_update_tick,
            refresh,
        })
    }

    /// Commit a quote produced by [`quote`](Self::quote).
    ///
    /// # Errors
    ///
    /// - [`OracleError::QuoteOutdated`] if the oracle was updated since the quote
    pub fn apply(&mut self, quote: RateQuote) -> Result<RateReading> {
        if quote.quoted_at != self.last_update_tick {
            return Err(OracleError::QuoteOutdated {
                quoted_at: quote.quoted_at,
                last_update: self.last_update_tick,
            });
        }
        if !quote.refresh {
            return Ok(RateReading {
                rate: self.rate,
                event: None,
            });
        }

        self.rate = quote.rate;
        self.last_update_tick = quote.tick;
        tracing::info!(
            price_feed = PRICE_FEED,
            rate = quote.rate,
            block = quote.tick,
            "stale oracle rate refreshed"
        );
        let event = Event::new(
            EventType::RateRefreshed,
            self.address,
            quote.tick,
            serde_json::json!({ "price_feed": PRICE_FEED, "rate": quote.rate }),
        );
        Ok(RateReading {
            rate: quote.rate,
            event: Some(event),
        })
    }

    /// Read the rate, refreshing it first if it has gone stale. Anyone may
    /// call this.
    ///
    /// # Errors
    ///
    /// See [`quote`](Self::quote).
    pub fn get_rate(&mut self, caller: &Address) -> Result<RateReading> {
        let quote = self.quote()?;
        tracing::trace!(%caller, refresh = quote.refresh, "oracle rate read");
        self.apply(quote)
    }
}
