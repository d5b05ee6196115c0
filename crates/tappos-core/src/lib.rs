//! # tappos-core: Pure Business Logic for TapPOS
//!
//! This crate is the heart of the TapPOS settlement backend. It
//! contains the domain model and business rules as pure code with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TapPOS Architecture                              │
//! │                                                                         │
//! │  RFID reader ──► Scan Ingress Bus ──► tappos-engine                    │
//! │                                        │    router / settlement        │
//! │                                        ▼                                │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ tappos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ validation│  │   error   │  │   │
//! │  │   │ Customer  │  │   Money   │  │   rules   │  │ CoreError │  │   │
//! │  │   │ Product   │  │  (cents)  │  │  checks   │  │Validation │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                          tappos-db (SQLite repositories)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, no side effects
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
