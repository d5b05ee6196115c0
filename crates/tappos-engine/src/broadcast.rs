//! # Fan-out Broadcaster
//!
//! Best-effort delivery of events to connected observers (dashboards).
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Fan-out Broadcaster                               │
//! │                                                                         │
//! │  Router ────┐                                                           │
//! │             │  publish(event, payload)                                  │
//! │  Engine ────┤        │                                                  │
//! │             │        ▼                                                  │
//! │             │  tokio::sync::broadcast (bounded ring)                    │
//! │             │        │                                                  │
//! │             │        ├──► Dashboard A (subscriber)                      │
//! │             │        ├──► Dashboard B (subscriber)                      │
//! │             │        └──► Dashboard C (lagging → drops old events)      │
//! │                                                                         │
//! │  • publish never blocks and never fails                                 │
//! │  • no subscribers is fine (events fall on the floor)                    │
//! │  • a slow observer lags and loses messages, it is never awaited        │
//! │  • no ordering promise across observers, no replay                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The real WebSocket fan-out lives outside this system; a transport
//! adapter holds a subscription and forwards events to its sockets.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Default capacity of the broadcast ring buffer.
pub const DEFAULT_CAPACITY: usize = 256;

/// Event names published by the core.
pub const EVENT_RFID_SCAN: &str = "rfid_scan";
pub const EVENT_CHECKOUT: &str = "checkout";

// =============================================================================
// Dashboard Event
// =============================================================================

/// One structured message delivered to every current observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardEvent {
    /// Event name ("rfid_scan", "checkout").
    pub event: String,
    /// Event-specific payload.
    pub payload: Value,
    /// ISO-8601 observation timestamp.
    pub timestamp: String,
}

// =============================================================================
// Broadcaster
// =============================================================================

/// Best-effort fan-out over an unbounded observer set.
///
/// Cloning is cheap; the router and the settlement engine each hold
/// their own clone of one shared broadcaster.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<DashboardEvent>,
}

impl Broadcaster {
    /// Creates a broadcaster with the given ring capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Broadcaster { tx }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Infallible by contract: a send error only means nobody is
    /// listening right now, which is not the publisher's problem.
    pub fn publish(&self, event: &str, payload: Value) {
        let message = DashboardEvent {
            event: event.to_string(),
            payload,
            timestamp: Utc::now().to_rfc3339(),
        };

        let delivered = self.tx.send(message).unwrap_or(0);
        debug!(event, observers = delivered, "Broadcast event");
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// Number of currently-connected observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Broadcaster::new(DEFAULT_CAPACITY)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_fail() {
        let broadcaster = Broadcaster::default();
        // Must not panic or error
        broadcaster.publish(EVENT_CHECKOUT, json!({"amount_cents": 1500}));
        assert_eq!(broadcaster.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_tagged_events() {
        let broadcaster = Broadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(EVENT_RFID_SCAN, json!({"uid": "TAG001"}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, EVENT_RFID_SCAN);
        assert_eq!(event.payload["uid"], "TAG001");
        // RFC 3339 timestamps parse back
        assert!(chrono::DateTime::parse_from_rfc3339(&event.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_lagging_observer_drops_instead_of_blocking() {
        let broadcaster = Broadcaster::new(4);
        let mut rx = broadcaster.subscribe();

        // Overrun the ring while the observer sleeps
        for i in 0..32 {
            broadcaster.publish(EVENT_RFID_SCAN, json!({ "seq": i }));
        }

        // First recv reports the lag; later events are still delivered
        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(missed)) => assert!(missed > 0),
            other => panic!("expected lag, got {other:?}"),
        }
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, EVENT_RFID_SCAN);
    }

    #[tokio::test]
    async fn test_multiple_observers_all_receive() {
        let broadcaster = Broadcaster::default();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.publish(EVENT_CHECKOUT, json!({"customer": "Ada"}));

        assert_eq!(a.recv().await.unwrap().payload["customer"], "Ada");
        assert_eq!(b.recv().await.unwrap().payload["customer"], "Ada");
    }
}
