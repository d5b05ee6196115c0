//! # tappos-engine: Settlement Backend for TapPOS
//!
//! This crate wires the domain model and the database layer into the
//! three operational components of the settlement backend: the scan
//! router, the settlement engine and the top-up ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       TapPOS Settlement Backend                         │
//! │                                                                         │
//! │  RFID reader ──► ingress (ScanBus)                                     │
//! │                      │                                                  │
//! │  ┌───────────────────┼─────────────────────────────────────────────┐   │
//! │  │                   ▼     tappos-engine (THIS CRATE)              │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │  ScanRouter   │   │ Settlement     │   │  TopUpLedger  │   │   │
//! │  │   │  (router.rs)  │   │ Engine         │   │  (topup.rs)   │   │   │
//! │  │   │               │   │ (settlement.rs)│   │               │   │   │
//! │  │   │ customer ►    │   │ identify       │   │ credit then   │   │   │
//! │  │   │ product ►     │   │ check balance  │   │ audit, never  │   │   │
//! │  │   │ unregistered  │   │ settle + debit │   │ claw back     │   │   │
//! │  │   └───────┬───────┘   └───────┬────────┘   └───────────────┘   │   │
//! │  │           │                   │                                 │   │
//! │  │           └───────┬───────────┘                                 │   │
//! │  │                   ▼                                             │   │
//! │  │           Broadcaster (broadcast.rs) ──► dashboards            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │        tappos-db (SQLite repositories) ──► tappos-core (domain)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transports (the actual MQTT client, WebSocket server and HTTP
//! routes) live outside this crate; they hold a [`ScanPublisher`], a
//! [`Broadcaster`] subscription, and call [`SettlementEngine`] and
//! [`TopUpLedger`] directly.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod broadcast;
pub mod config;
pub mod error;
pub mod ingress;
pub mod router;
pub mod settlement;
pub mod topup;

// =============================================================================
// Re-exports
// =============================================================================

pub use broadcast::{Broadcaster, DashboardEvent, EVENT_CHECKOUT, EVENT_RFID_SCAN};
pub use config::{EngineConfig, SettlementMode, StockPolicy, TotalCheck};
pub use error::{EngineError, EngineResult, SettlementStep};
pub use ingress::{ScanBus, ScanMessage, ScanPublisher};
pub use router::ScanRouter;
pub use settlement::SettlementEngine;
pub use topup::{TopUpLedger, TopUpReceipt};
