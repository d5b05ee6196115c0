//! # Top-Up Ledger
//!
//! Credits customer wallets and keeps the append-only audit trail.
//!
//! ## Credit Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Top-Up Ordering                                    │
//! │                                                                         │
//! │  1. Atomic balance increment (UPDATE ... + ?amount RETURNING)          │
//! │       │                                                                 │
//! │       │  miss ──► CustomerNotFound (no audit row either)               │
//! │       ▼                                                                 │
//! │  2. Append audit record                                                 │
//! │       │                                                                 │
//! │       │  failure ──► logged, NOT rolled back                           │
//! │       ▼                                                                 │
//! │  new balance returned to the caller                                    │
//! │                                                                         │
//! │  The customer's money is never taken back because bookkeeping          │
//! │  hiccupped: a missing audit row is a data-quality defect, a            │
//! │  clawed-back credit would be a balance-correctness defect.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use tappos_core::validation::validate_amount;
use tappos_core::TopUp;
use tappos_db::repository::topup::generate_topup_id;
use tappos_db::{Database, DbError};

/// Outcome of a successful top-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopUpReceipt {
    pub topup_id: String,
    pub new_balance_cents: i64,
}

/// The top-up ledger.
#[derive(Clone)]
pub struct TopUpLedger {
    db: Database,
}

impl TopUpLedger {
    /// Creates a new ledger.
    pub fn new(db: Database) -> Self {
        TopUpLedger { db }
    }

    /// Credits a customer's wallet and records the audit entry.
    ///
    /// The amount must be strictly positive; this path can never be
    /// used to debit a wallet.
    pub async fn top_up(
        &self,
        customer_id: &str,
        amount_cents: i64,
        method: &str,
    ) -> EngineResult<TopUpReceipt> {
        validate_amount("amount_cents", amount_cents)?;

        let new_balance = match self
            .db
            .customers()
            .credit_balance(customer_id, amount_cents)
            .await
        {
            Ok(balance) => balance,
            Err(DbError::NotFound { .. }) => return Err(EngineError::CustomerNotFound),
            Err(e) => return Err(e.into()),
        };

        let topup = TopUp {
            id: generate_topup_id(),
            customer_id: customer_id.to_string(),
            amount_cents,
            method: method.to_string(),
            created_at: Utc::now(),
        };
        // Credit first, audit second. The credit stands even if the
        // audit insert fails.
        if let Err(e) = self.db.topups().insert(&topup).await {
            warn!(
                topup_id = %topup.id,
                customer_id,
                amount = amount_cents,
                error = %e,
                "Top-up audit record failed; balance credit stands"
            );
        }

        info!(
            topup_id = %topup.id,
            customer_id,
            amount = amount_cents,
            new_balance,
            "Wallet topped up"
        );

        Ok(TopUpReceipt {
            topup_id: topup.id,
            new_balance_cents: new_balance,
        })
    }

    /// Lists the audit trail for one customer, newest first.
    pub async fn history(&self, customer_id: &str) -> EngineResult<Vec<TopUp>> {
        Ok(self.db.topups().list_for_customer(customer_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tappos_db::{DbConfig, NewCustomer};

    async fn fixture() -> (Database, TopUpLedger, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .create(NewCustomer {
                card_uid: "CARD001".to_string(),
                full_name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "$2b$10$hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();
        let ledger = TopUpLedger::new(db.clone());
        (db, ledger, customer.id)
    }

    #[tokio::test]
    async fn test_top_up_credits_and_records() {
        let (db, ledger, customer_id) = fixture().await;

        let receipt = ledger.top_up(&customer_id, 1000, "Dashboard").await.unwrap();
        assert_eq!(receipt.new_balance_cents, 1000);

        assert_eq!(db.customers().fetch_balance(&customer_id).await.unwrap(), 1000);
        let history = ledger.history(&customer_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount_cents, 1000);
        assert_eq!(history[0].method, "Dashboard");
    }

    #[tokio::test]
    async fn test_top_ups_accumulate() {
        let (db, ledger, customer_id) = fixture().await;

        ledger.top_up(&customer_id, 1000, "Dashboard").await.unwrap();
        let receipt = ledger.top_up(&customer_id, 2500, "Kiosk").await.unwrap();

        assert_eq!(receipt.new_balance_cents, 3500);
        assert_eq!(db.customers().fetch_balance(&customer_id).await.unwrap(), 3500);
        assert_eq!(ledger.history(&customer_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (db, ledger, customer_id) = fixture().await;

        let err = ledger.top_up(&customer_id, 0, "Dashboard").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        let err = ledger.top_up(&customer_id, -500, "Dashboard").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        assert_eq!(db.customers().fetch_balance(&customer_id).await.unwrap(), 0);
        assert!(ledger.history(&customer_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer_leaves_no_audit_row() {
        let (db, ledger, _) = fixture().await;

        let err = ledger.top_up("ghost", 1000, "Dashboard").await.unwrap_err();
        assert!(matches!(err, EngineError::CustomerNotFound));
        assert!(db.topups().list_for_customer("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_unavailable() {
        let (db, ledger, customer_id) = fixture().await;
        db.close().await;

        let err = ledger.top_up(&customer_id, 1000, "Dashboard").await.unwrap_err();
        assert!(matches!(err, EngineError::StorageUnavailable));
    }
}
