//! # Transaction Repository
//!
//! Database operations for settled transactions and their line items.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transaction Lifecycle                                │
//! │                                                                         │
//! │  1. INSERT (status = 'paid')                                           │
//! │     └── only the settlement engine writes here, and only after the     │
//! │         balance sufficiency check passed                               │
//! │                                                                         │
//! │  2. INSERT one transaction_items row per cart line                     │
//! │     └── unit_price_cents snapshots the quoted price                    │
//! │                                                                         │
//! │  3. IMMUTABLE                                                          │
//! │     └── no update path exists; failed checkouts never reach step 1     │
//! │                                                                         │
//! │  Under atomic settlement all inserts share one SQLite transaction      │
//! │  with the stock decrements and the wallet debit.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tappos_core::{Transaction, TransactionItem, TransactionSummary};

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a settled transaction (sequential settlement path).
    pub async fn insert(&self, transaction: &Transaction) -> DbResult<()> {
        insert_on(&self.pool, transaction).await
    }

    /// Inserts a line item (sequential settlement path).
    pub async fn insert_item(&self, item: &TransactionItem) -> DbResult<()> {
        insert_item_on(&self.pool, item).await
    }

    /// Gets a transaction by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, customer_id, total_cents, status, created_at
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Gets all line items of a transaction.
    pub async fn items_for(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT id, transaction_id, product_id, quantity, unit_price_cents, created_at
            FROM transaction_items
            WHERE transaction_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts all persisted transactions. Used by tests to verify the
    /// all-or-nothing property with a full-state diff.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Lists recent transactions for the admin history view, joined
    /// with the customer name and an aggregated items summary.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<TransactionSummary>> {
        debug!(limit, "Listing recent transactions");

        let rows = sqlx::query_as::<_, TransactionSummary>(
            r#"
            SELECT
                t.id,
                c.full_name AS customer_name,
                t.total_cents,
                t.status,
                COALESCE((
                    SELECT group_concat(ti.quantity || 'x item', ', ')
                    FROM transaction_items ti
                    WHERE ti.transaction_id = t.id
                ), '') AS items_summary,
                t.created_at
            FROM transactions t
            LEFT JOIN customers c ON c.id = t.customer_id
            ORDER BY t.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Inserts a transaction inside an open settlement transaction.
pub async fn insert_tx(conn: &mut SqliteConnection, transaction: &Transaction) -> DbResult<()> {
    insert_on(conn, transaction).await
}

/// Inserts a line item inside an open settlement transaction.
pub async fn insert_item_tx(conn: &mut SqliteConnection, item: &TransactionItem) -> DbResult<()> {
    insert_item_on(conn, item).await
}

async fn insert_on<'e, E>(executor: E, transaction: &Transaction) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    debug!(id = %transaction.id, total = transaction.total_cents, "Inserting transaction");

    sqlx::query(
        r#"
        INSERT INTO transactions (id, customer_id, total_cents, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.customer_id)
    .bind(transaction.total_cents)
    .bind(transaction.status)
    .bind(transaction.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_item_on<'e, E>(executor: E, item: &TransactionItem) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO transaction_items (
            id, transaction_id, product_id, quantity, unit_price_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&item.id)
    .bind(&item.transaction_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Generates a new transaction ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new line item ID.
pub fn generate_item_id() -> String {
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
    use crate::repository::product::NewProduct;
    use chrono::Utc;
    use tappos_core::TransactionStatus;

    async fn seeded_db() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let customer = db
            .customers()
            .create(NewCustomer {
                card_uid: "CARD001".to_string(),
                full_name: "Grace Hopper".to_string(),
                email: "grace@example.com".to_string(),
                password_hash: "$2b$10$hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();

        let product = db
            .products()
            .create(NewProduct {
                rfid_uid: "TAG001".to_string(),
                name: "Bottled Water".to_string(),
                unit_price_cents: 500,
                stock_quantity: 50,
                category: "Drink".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        (db, customer.id, product.id)
    }

    #[tokio::test]
    async fn test_insert_with_items_and_read_back() {
        let (db, customer_id, product_id) = seeded_db().await;
        let repo = db.transactions();

        let tx = Transaction {
            id: generate_transaction_id(),
            customer_id,
            total_cents: 1000,
            status: TransactionStatus::Paid,
            created_at: Utc::now(),
        };
        repo.insert(&tx).await.unwrap();

        let item = TransactionItem {
            id: generate_item_id(),
            transaction_id: tx.id.clone(),
            product_id,
            quantity: 2,
            unit_price_cents: 500,
            created_at: Utc::now(),
        };
        repo.insert_item(&item).await.unwrap();

        let found = repo.get_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(found.total_cents, 1000);
        assert_eq!(found.status, TransactionStatus::Paid);

        let items = repo.items_for(&tx.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price_cents, 500);
    }

    #[tokio::test]
    async fn test_list_recent_joins_customer_and_summarizes_items() {
        let (db, customer_id, product_id) = seeded_db().await;
        let repo = db.transactions();

        let tx = Transaction {
            id: generate_transaction_id(),
            customer_id,
            total_cents: 1500,
            status: TransactionStatus::Paid,
            created_at: Utc::now(),
        };
        repo.insert(&tx).await.unwrap();
        repo.insert_item(&TransactionItem {
            id: generate_item_id(),
            transaction_id: tx.id.clone(),
            product_id,
            quantity: 3,
            unit_price_cents: 500,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let recent = repo.list_recent(50).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].customer_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(recent[0].items_summary, "3x item");
    }
}
