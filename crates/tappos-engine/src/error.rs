//! # Engine Error Types
//!
//! The failure taxonomy callers of the checkout and top-up operations
//! see.
//!
//! ## Propagation Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outcome Classification                               │
//! │                                                                         │
//! │  EXPECTED (structured results, not crashes)                            │
//! │  ├── IdentificationRequired - no card, no session                      │
//! │  ├── CustomerNotFound       - presented card matches nobody            │
//! │  └── InsufficientBalance    - wallet below total; nothing mutated      │
//! │                                                                         │
//! │  STORE-LEVEL                                                           │
//! │  ├── DuplicateKey        - uniqueness violated on create               │
//! │  ├── StorageUnavailable  - store unreachable; fail, never guess        │
//! │  └── Storage             - other database failure, message kept        │
//! │                            generic for callers                         │
//! │                                                                         │
//! │  DEGRADED PATH                                                         │
//! │  └── PartialSettlement   - mid-sequence failure without a wrapping     │
//! │                            transaction; logged with step + ids,        │
//! │                            surfaced as a generic failure               │
//! │                                                                         │
//! │  The router is absent from this taxonomy on purpose: classification   │
//! │  never fails, it degrades to Unregistered.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use tappos_core::{CoreError, ValidationError};
use tappos_db::DbError;

// =============================================================================
// Settlement Step
// =============================================================================

/// Which step of the settlement protocol failed. Logged alongside
/// entity ids to support manual reconciliation of the degraded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStep {
    InsertTransaction,
    InsertLineItem,
    DecrementStock,
    DebitWallet,
}

impl std::fmt::Display for SettlementStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SettlementStep::InsertTransaction => "insert_transaction",
            SettlementStep::InsertLineItem => "insert_line_item",
            SettlementStep::DecrementStock => "decrement_stock",
            SettlementStep::DebitWallet => "debit_wallet",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Errors produced by the settlement engine and top-up ledger.
///
/// Messages are short, human-readable and never leak SQL or internal
/// record ids.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Neither a card UID nor a session identity resolved a customer.
    /// No mutation was attempted.
    #[error("Identification required (log in or tap card)")]
    IdentificationRequired,

    /// A presented card UID does not match any customer.
    #[error("Customer not found for presented card")]
    CustomerNotFound,

    /// Wallet balance below requested total at check time.
    /// No mutation was attempted.
    #[error("Insufficient balance on customer card")]
    InsufficientBalance,

    /// The caller-supplied total disagrees with the sum of line totals
    /// (strict total checking only).
    #[error("Cart total does not match line items")]
    TotalMismatch {
        supplied_cents: i64,
        computed_cents: i64,
    },

    /// Uniqueness constraint violated on create.
    #[error("Duplicate value: {field} already in use")]
    DuplicateKey { field: String },

    /// The backing store could not be reached. The operation failed
    /// outright rather than guessing at state.
    #[error("Storage unavailable, try again")]
    StorageUnavailable,

    /// Mid-sequence failure on the degraded (non-atomic) path. The
    /// step and ids are in the logs; the caller gets a generic failure.
    #[error("Checkout failed; settlement may be incomplete")]
    PartialSettlement { step: SettlementStep },

    /// Business rule violation (missing product, strict stock shortfall).
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Request validation failure.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Any other database failure. The wrapped detail is for logs;
    /// `Display` stays generic.
    #[error("Storage operation failed")]
    Storage(#[source] DbError),
}

impl EngineError {
    /// True for expected, caller-facing outcomes that are part of
    /// normal operation rather than faults.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            EngineError::IdentificationRequired
                | EngineError::CustomerNotFound
                | EngineError::InsufficientBalance
                | EngineError::Validation(_)
        )
    }
}

/// Classifies database failures into the caller-facing taxonomy.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            return EngineError::StorageUnavailable;
        }
        match err {
            DbError::UniqueViolation { field } => EngineError::DuplicateKey { field },
            other => EngineError::Storage(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_db_errors_map_to_storage_unavailable() {
        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::StorageUnavailable));

        let err: EngineError = DbError::ConnectionFailed("gone".into()).into();
        assert!(matches!(err, EngineError::StorageUnavailable));
    }

    #[test]
    fn test_duplicate_key_mapping() {
        let err: EngineError = DbError::duplicate("customers.email").into();
        assert!(matches!(err, EngineError::DuplicateKey { .. }));
    }

    #[test]
    fn test_storage_message_stays_generic() {
        let err: EngineError =
            DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.to_string(), "Storage operation failed");
    }

    #[test]
    fn test_expected_outcomes() {
        assert!(EngineError::InsufficientBalance.is_expected());
        assert!(EngineError::IdentificationRequired.is_expected());
        assert!(!EngineError::StorageUnavailable.is_expected());
        assert!(!EngineError::PartialSettlement {
            step: SettlementStep::DebitWallet
        }
        .is_expected());
    }
}
