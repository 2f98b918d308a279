//! Tick sources.
//!
//! Contracts never read wall-clock time directly. They are handed a
//! [`Clock`] at construction and ask it for the current tick, so tests can
//! drive time deterministically and the daemon can drive it from its block
//! producer.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Tick;

/// A monotonic tick counter (block height analog).
pub trait Clock: Send + Sync {
    /// The current tick.
    fn current_tick(&self) -> Tick;
}

/// Block counter advanced explicitly by whoever produces blocks.
#[derive(Debug, Default)]
pub struct BlockClock {
    block: AtomicU64,
}

impl BlockClock {
    /// Start the chain at `genesis`.
    pub fn new(genesis: Tick) -> Self {
        Self {
            block: AtomicU64::new(genesis),
        }
    }

    /// Produce one block and return the new block number.
    pub fn mine(&self) -> Tick {
        self.mine_many(1)
    }

    /// Produce `count` blocks and return the new block number.
    pub fn mine_many(&self, count: u64) -> Tick {
        let previous = self.block.fetch_add(count, Ordering::SeqCst);
        let current = previous.saturating_add(count);
        tracing::trace!(block = current, "block produced");
        current
    }
}

impl Clock for BlockClock {
    fn current_tick(&self) -> Tick {
        self.block.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis() {
        let clock = BlockClock::new(5);
        assert_eq!(clock.current_tick(), 5);
    }

    #[test]
    fn test_mine() {
        let clock = BlockClock::new(1);
        assert_eq!(clock.mine(), 2);
        assert_eq!(clock.mine_many(3), 5);
        assert_eq!(clock.current_tick(), 5);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let clock: std::sync::Arc<dyn Clock> = std::sync::Arc::new(BlockClock::new(9));
        assert_eq!(clock.current_tick(), 9);
    }
}
