//! # tappos-db: Database Layer for TapPOS
//!
//! This crate provides database access for the TapPOS settlement
//! backend. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TapPOS Data Flow                                 │
//! │                                                                         │
//! │  tappos-engine (classify / checkout / top_up)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tappos-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CustomerRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ TxRepo        │    │              │  │   │
//! │  │   │               │    │ TopUpRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Contract
//!
//! The two hot fields - `customers.wallet_balance_cents` and
//! `products.stock_quantity` - are only ever mutated through
//! single-statement atomic deltas defined here. Callers never perform
//! read-modify-write against either column.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tappos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tappos.db")).await?;
//! let customer = db.customers().get_by_card_uid("04A1B2C3").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::product::{NewProduct, ProductRepository, ProductUpdate};
pub use repository::topup::TopUpRepository;
pub use repository::transaction::TransactionRepository;
