//! Event emission system.
//!
//! Contract events from every RPC call are republished on a broadcast bus.
//! Connections that called `subscribe_events` receive them as JSON-RPC
//! notifications. Each subscriber has an independent buffer; a subscriber
//! that falls behind loses the oldest events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::warn;

use hbank_types::{Address, Event, EventType};

/// Filter for event subscriptions. Absent fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    /// Only these event types.
    #[serde(default)]
    pub event_types: Option<Vec<EventType>>,
    /// Only events emitted by these contracts.
    #[serde(default)]
    pub emitters: Option<Vec<Address>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Emit events in order.
    pub fn emit_all(&self, events: &[Event]) {
        for event in events {
            self.emit(event.clone());
        }
    }

    /// Subscribe to events matching `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }
        if let Some(ref emitters) = self.emitters {
            if !emitters.contains(&event.emitter) {
                return false;
            }
        }
        true
    }
}

/// A filtered receiver on the event bus.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    filter: EventFilter,
}

impl Subscription {
    /// Next matching event, or `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: EventType, emitter: Address) -> Event {
        Event::new(event_type, emitter, 1, serde_json::json!({}))
    }

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(EventFilter::default());

        bus.emit(event(EventType::Deposited, Address::from_index(1)));

        let received = sub.next().await.expect("receive event");
        assert_eq!(received.event_type, EventType::Deposited);
        assert_eq!(bus.sequence(), 1);
    }

    #[tokio::test]
    async fn test_subscription_skips_filtered() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(EventFilter {
            event_types: Some(vec![EventType::RateRefreshed]),
            emitters: None,
        });

        bus.emit_all(&[
            event(EventType::Deposited, Address::from_index(1)),
            event(EventType::RateRefreshed, Address::from_index(2)),
        ]);

        let received = sub.next().await.expect("receive event");
        assert_eq!(received.event_type, EventType::RateRefreshed);
        assert_eq!(bus.sequence(), 2);
    }

    #[test]
    fn test_event_filter_emitters() {
        let oracle = Address::from_index(7);
        let filter: EventFilter =
            serde_json::from_value(serde_json::json!({ "emitters": [oracle] }))
                .expect("parse filter");

        assert!(filter.matches(&event(EventType::RateUpdated, oracle)));
        assert!(!filter.matches(&event(EventType::RateUpdated, Address::from_index(8))));
    }

    #[test]
    fn test_event_filter_types_from_json() {
        let filter: EventFilter = serde_json::from_value(serde_json::json!({
            "event_types": ["deposited", "withdrawn"]
        }))
        .expect("parse filter");

        let bank = Address::from_index(3);
        assert!(filter.matches(&event(EventType::Withdrawn, bank)));
        assert!(!filter.matches(&event(EventType::RateRefreshed, bank)));
    }
}
