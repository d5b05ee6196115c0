//! # Scan Ingress Bus
//!
//! Abstract stand-in for the reader-to-backend message topic.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Ingress Bus                                 │
//! │                                                                         │
//! │  RFID edge controller ──► status topic ──► transport adapter           │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                     ScanPublisher::publish_raw          │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                     mpsc::Receiver<ScanMessage>         │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                     ScanRouter::run                     │
//! │                                                                         │
//! │  • at-least-once: the reader re-publishes a card held near it,         │
//! │    so the same UID arrives repeatedly - no de-duplication here         │
//! │  • payload is the topic's JSON: {"uid": "...", ...}                    │
//! │  • no acknowledgment flows back to the reader                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use tokio::sync::mpsc;

/// Default channel capacity; one kiosk reader cannot outrun this.
pub const DEFAULT_CAPACITY: usize = 64;

/// One raw message from the status topic.
#[derive(Debug, Clone)]
pub struct ScanMessage {
    /// Raw payload as delivered by the bus.
    pub payload: String,
}

/// The subset of the edge controller's payload the router cares about.
/// Extra fields (local balance cache, timestamp) are ignored.
#[derive(Debug, Deserialize)]
pub struct ScanPayload {
    #[serde(default)]
    pub uid: Option<String>,
}

/// Sending half handed to the transport adapter (and to tests).
#[derive(Debug, Clone)]
pub struct ScanPublisher {
    tx: mpsc::Sender<ScanMessage>,
}

impl ScanPublisher {
    /// Publishes a raw topic payload.
    ///
    /// Returns `false` when the router side is gone; the bus contract
    /// has no acknowledgment, so callers may ignore it.
    pub async fn publish_raw(&self, payload: impl Into<String>) -> bool {
        self.tx
            .send(ScanMessage {
                payload: payload.into(),
            })
            .await
            .is_ok()
    }

    /// Convenience: publishes a well-formed scan for the given UID.
    pub async fn publish_uid(&self, uid: &str) -> bool {
        self.publish_raw(format!("{{\"uid\":\"{uid}\"}}")).await
    }
}

/// The scan ingress bus.
pub struct ScanBus;

impl ScanBus {
    /// Creates the bus: a publisher handle for the transport adapter
    /// and the receiver the router consumes.
    pub fn channel(capacity: usize) -> (ScanPublisher, mpsc::Receiver<ScanMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ScanPublisher { tx }, rx)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let (publisher, mut rx) = ScanBus::channel(DEFAULT_CAPACITY);

        assert!(publisher.publish_uid("TAG001").await);
        let msg = rx.recv().await.unwrap();

        let parsed: ScanPayload = serde_json::from_str(&msg.payload).unwrap();
        assert_eq!(parsed.uid.as_deref(), Some("TAG001"));
    }

    #[tokio::test]
    async fn test_duplicates_are_delivered_as_is() {
        let (publisher, mut rx) = ScanBus::channel(DEFAULT_CAPACITY);

        // A card held near the reader produces repeated scans
        publisher.publish_uid("CARD001").await;
        publisher.publish_uid("CARD001").await;

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_publish_after_router_gone() {
        let (publisher, rx) = ScanBus::channel(DEFAULT_CAPACITY);
        drop(rx);
        assert!(!publisher.publish_uid("TAG001").await);
    }
}
