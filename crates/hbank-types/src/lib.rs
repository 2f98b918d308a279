//! # hbank-types
//!
//! Shared domain types used across the HBank workspace: account identities,
//! the tick clock, the native-currency balance book and contract events.

pub mod address;
pub mod clock;
pub mod events;
pub mod native;

use std::sync::{Arc, Mutex};

pub use address::{Address, AddressParseError};
pub use clock::{BlockClock, Clock};
pub use events::{Event, EventType};
pub use native::{NativeBalances, NativeError};

/// Block-number analog used for staleness and elapsed-time computation.
pub type Tick = u64;

/// Smallest native-currency unit.
pub type Wei = u128;

/// Reward token amount in its smallest unit (18 decimals).
pub type TokenAmount = u128;

/// Wei per Ether (1 Ether = 10^18 wei).
pub const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// A component instance shared between its owner and the contracts that
/// call into it. Every mutation goes through the mutex.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a component in a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Services the host chain provides to every contract: the tick counter and
/// native-currency custody.
#[derive(Clone)]
pub struct Host {
    pub clock: Arc<dyn Clock>,
    pub native: Shared<NativeBalances>,
}

impl Host {
    pub fn new(clock: Arc<dyn Clock>, native: Shared<NativeBalances>) -> Self {
        Self { clock, native }
    }
}
