//! # Repository Module
//!
//! Repository implementations for database operations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Repository Pattern                                  │
//! │                                                                         │
//! │  tappos-engine (router, settlement, ledger)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (this module) ← SQL lives here, nowhere else               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlitePool → SQLite                                                   │
//! │                                                                         │
//! │  Two call shapes:                                                       │
//! │  • Pool-based methods on the repo structs (ordinary CRUD and the       │
//! │    single-statement atomic deltas)                                     │
//! │  • `*_tx` free functions over &mut SqliteConnection, for the steps     │
//! │    the settlement engine runs inside one SQLite transaction            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod product;
pub mod topup;
pub mod transaction;
