//! # RFID Event Classification Router
//!
//! Disambiguates raw tag-UID scans into customer card, product tag or
//! unregistered, and fans the result out to observers.
//!
//! ## Classification Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Classification Flow                                │
//! │                                                                         │
//! │  ScanMessage (raw JSON from the bus)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse payload ── malformed / empty uid ──► dropped (debug log)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  customers.get_by_card_uid(uid)   ← ALWAYS FIRST                       │
//! │       │                                                                 │
//! │       ├── hit  ──► ScanResult::Customer (public projection)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products.get_by_rfid_uid(uid)                                         │
//! │       │                                                                 │
//! │       ├── hit  ──► ScanResult::Product                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ScanResult::Unregistered { uid }                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  broadcast "rfid_scan" (best-effort, never fails the router)           │
//! │                                                                         │
//! │  Store unreachable? Classify as Unregistered anyway - observers        │
//! │  see every scan attempt, and the failure goes to the log. There is     │
//! │  no response channel back to the scanner.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::broadcast::{Broadcaster, EVENT_RFID_SCAN};
use crate::ingress::{ScanMessage, ScanPayload};
use tappos_core::validation::validate_uid;
use tappos_core::ScanResult;
use tappos_db::Database;

/// Routes raw scan events to a typed classification.
#[derive(Clone)]
pub struct ScanRouter {
    db: Database,
    broadcaster: Broadcaster,
}

impl ScanRouter {
    /// Creates a new router over injected collaborators.
    pub fn new(db: Database, broadcaster: Broadcaster) -> Self {
        ScanRouter { db, broadcaster }
    }

    /// Classifies a tag UID.
    ///
    /// ## Priority
    /// The customer check precedes the product check: if a UID were
    /// ever reused across both sets, it classifies as a customer.
    ///
    /// ## Failure Semantics
    /// Never errors. A storage failure degrades to `Unregistered` so
    /// observers still see the scan attempt.
    pub async fn classify(&self, uid: &str) -> ScanResult {
        match self.db.customers().get_by_card_uid(uid).await {
            Ok(Some(customer)) => {
                return ScanResult::Customer {
                    uid: uid.to_string(),
                    customer: customer.card_view(),
                };
            }
            Ok(None) => {}
            Err(e) => {
                warn!(uid, error = %e, "Customer lookup failed, degrading to unregistered");
                return ScanResult::Unregistered {
                    uid: uid.to_string(),
                };
            }
        }

        match self.db.products().get_by_rfid_uid(uid).await {
            Ok(Some(product)) => ScanResult::Product {
                uid: uid.to_string(),
                product,
            },
            Ok(None) => ScanResult::Unregistered {
                uid: uid.to_string(),
            },
            Err(e) => {
                warn!(uid, error = %e, "Product lookup failed, degrading to unregistered");
                ScanResult::Unregistered {
                    uid: uid.to_string(),
                }
            }
        }
    }

    /// Handles one raw bus message: parse, classify, broadcast.
    ///
    /// Malformed payloads and missing/invalid UIDs are a no-op; each
    /// redelivery of the same UID is classified independently.
    pub async fn handle_message(&self, msg: ScanMessage) {
        let uid = match serde_json::from_str::<ScanPayload>(&msg.payload) {
            Ok(ScanPayload { uid: Some(uid) }) => uid,
            Ok(ScanPayload { uid: None }) => {
                debug!(payload = %msg.payload, "Scan payload without uid, dropping");
                return;
            }
            Err(e) => {
                debug!(payload = %msg.payload, error = %e, "Malformed scan payload, dropping");
                return;
            }
        };

        if let Err(e) = validate_uid(&uid) {
            debug!(uid = %uid, error = %e, "Invalid uid, dropping scan");
            return;
        }

        let result = self.classify(&uid).await;
        debug!(uid = %uid, classification = classification_name(&result), "Scan classified");

        // serde_json::to_value on our own types cannot fail; fall back
        // to the bare uid if it somehow does
        let payload = serde_json::to_value(&result)
            .unwrap_or_else(|_| serde_json::json!({ "type": "unregistered", "uid": uid }));
        self.broadcaster.publish(EVENT_RFID_SCAN, payload);
    }

    /// Consumes the ingress bus until the transport side closes it.
    pub async fn run(self, mut rx: mpsc::Receiver<ScanMessage>) {
        info!("Scan router started");
        while let Some(msg) = rx.recv().await {
            self.handle_message(msg).await;
        }
        info!("Scan ingress closed, router stopping");
    }
}

fn classification_name(result: &ScanResult) -> &'static str {
    match result {
        ScanResult::Customer { .. } => "customer",
        ScanResult::Product { .. } => "product",
        ScanResult::Unregistered { .. } => "unregistered",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
