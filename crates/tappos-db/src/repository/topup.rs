//! # Top-Up Repository
//!
//! Append-only audit records for wallet credits.
//!
//! The balance increment itself lives in the customer repository
//! (`credit_balance`); this repository only records that it happened.
//! The top-up ledger orders the balance mutation first, the audit
//! insert second, and never rolls the balance back on audit failure.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tappos_core::TopUp;

/// Repository for top-up audit records.
#[derive(Debug, Clone)]
pub struct TopUpRepository {
    pool: SqlitePool,
}

impl TopUpRepository {
    /// Creates a new TopUpRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TopUpRepository { pool }
    }

    /// Appends one audit record.
    pub async fn insert(&self, topup: &TopUp) -> DbResult<()> {
        debug!(customer_id = %topup.customer_id, amount = topup.amount_cents, "Recording top-up");

        sqlx::query(
            r#"
            INSERT INTO topups (id, customer_id, amount_cents, method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&topup.id)
        .bind(&topup.customer_id)
        .bind(topup.amount_cents)
        .bind(&topup.method)
        .bind(topup.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists top-ups for one customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<TopUp>> {
        let topups = sqlx::query_as::<_, TopUp>(
            r#"
            SELECT id, customer_id, amount_cents, method, created_at
            FROM topups
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(topups)
    }
}

/// Generates a new top-up ID.
pub fn generate_topup_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::NewCustomer;
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .create(NewCustomer {
                card_uid: "CARD001".to_string(),
                full_name: "Test".to_string(),
                email: "t@example.com".to_string(),
                password_hash: "$2b$10$hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();

        let repo = db.topups();
        repo.insert(&TopUp {
            id: generate_topup_id(),
            customer_id: customer.id.clone(),
            amount_cents: 1000,
            method: "Dashboard".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let listed = repo.list_for_customer(&customer.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount_cents, 1000);
        assert_eq!(listed[0].method, "Dashboard");
    }
}
