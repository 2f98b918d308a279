//! Contract events.
//!
//! Events are returned to the caller inside call receipts and republished by
//! the daemon on its event bus.

use serde::{Deserialize, Serialize};

use crate::{Address, Tick};

/// Envelope for every contract event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    /// Contract that emitted the event.
    pub emitter: Address,
    /// Tick at which the event was emitted.
    pub tick: Tick,
    pub payload: serde_json::Value,
}

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Oracle
    RateRefreshed,
    RateUpdated,
    OwnershipTransferred,

    // Bank
    Deposited,
    Withdrawn,
}

impl Event {
    /// Build an event with the given payload.
    pub fn new(
        event_type: EventType,
        emitter: Address,
        tick: Tick,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            emitter,
            tick,
            payload,
        }
    }

    /// Read a string field out of the payload.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}
