//! # Customer Repository
//!
//! Database operations for customers and their wallets.
//!
//! ## The Two Wallet Mutations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Wallet Mutation Discipline                           │
//! │                                                                         │
//! │  credit_balance (top-up ledger)                                        │
//! │    UPDATE customers                                                     │
//! │    SET wallet_balance_cents = wallet_balance_cents + ?delta            │
//! │    WHERE id = ?                                                         │
//! │                                                                         │
//! │  debit_balance_checked (settlement engine)                             │
//! │    UPDATE customers                                                     │
//! │    SET wallet_balance_cents = wallet_balance_cents - ?delta            │
//! │    WHERE id = ? AND wallet_balance_cents >= ?delta                     │
//! │                                                                         │
//! │  Both are single statements: a concurrent top-up racing a kiosk        │
//! │  checkout cannot lose an update, and the conditional debit can         │
//! │  never drive the balance negative. The caller NEVER does               │
//! │  fetch-modify-write on this column.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tappos_core::Customer;

/// Fields required to register a new customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub card_uid: String,
    pub full_name: String,
    pub email: String,
    /// Already-hashed password from the (external) auth layer.
    pub password_hash: String,
    pub is_admin: bool,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a new customer with a zero wallet balance.
    ///
    /// ## Duplicate Keys
    /// A card UID or email already in use surfaces as
    /// [`DbError::UniqueViolation`]; no partial record is persisted.
    pub async fn create(&self, new: NewCustomer) -> DbResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            card_uid: new.card_uid,
            full_name: new.full_name,
            email: new.email,
            password_hash: new.password_hash,
            wallet_balance_cents: 0,
            is_admin: new.is_admin,
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, card_uid = %customer.card_uid, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, card_uid, full_name, email,
                password_hash, wallet_balance_cents, is_admin, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.card_uid)
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(customer.wallet_balance_cents)
        .bind(customer.is_admin)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, card_uid, full_name, email,
                   password_hash, wallet_balance_cents, is_admin, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by the UID of their physical card.
    ///
    /// This is the router's first lookup and the "tap card to pay"
    /// identification path.
    pub async fn get_by_card_uid(&self, card_uid: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, card_uid, full_name, email,
                   password_hash, wallet_balance_cents, is_admin, created_at
            FROM customers
            WHERE card_uid = ?1
            "#,
        )
        .bind(card_uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by email (login path).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, card_uid, full_name, email,
                   password_hash, wallet_balance_cents, is_admin, created_at
            FROM customers
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Re-fetches the current wallet balance.
    ///
    /// The settlement engine calls this immediately before the
    /// sufficiency check. Caller-supplied balances are never trusted.
    pub async fn fetch_balance(&self, id: &str) -> DbResult<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT wallet_balance_cents FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        balance.ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Atomically credits the wallet. Returns the new balance.
    pub async fn credit_balance(&self, id: &str, amount_cents: i64) -> DbResult<i64> {
        debug!(customer_id = %id, amount = amount_cents, "Crediting wallet");

        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET wallet_balance_cents = wallet_balance_cents + ?1
            WHERE id = ?2
            RETURNING wallet_balance_cents
            "#,
        )
        .bind(amount_cents)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        new_balance.ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Atomically debits the wallet, but only if the resulting balance
    /// stays non-negative.
    ///
    /// ## Returns
    /// * `Some(new_balance)` - debit landed
    /// * `None` - balance was insufficient at debit time (a concurrent
    ///   spend may have raced past the earlier sufficiency check)
    pub async fn debit_balance_checked(
        &self,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<Option<i64>> {
        debug!(customer_id = %id, amount = amount_cents, "Debiting wallet (checked)");

        let new_balance = debit_balance_checked_on(&self.pool, id, amount_cents).await?;
        Ok(new_balance)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Checked wallet debit inside an open settlement transaction.
pub async fn debit_balance_checked_tx(
    conn: &mut SqliteConnection,
    id: &str,
    amount_cents: i64,
) -> DbResult<Option<i64>> {
    debit_balance_checked_on(conn, id, amount_cents).await
}

/// Shared debit statement, generic over pool or open transaction.
async fn debit_balance_checked_on<'e, E>(
    executor: E,
    id: &str,
    amount_cents: i64,
) -> DbResult<Option<i64>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let new_balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE customers
        SET wallet_balance_cents = wallet_balance_cents - ?1
        WHERE id = ?2 AND wallet_balance_cents >= ?1
        RETURNING wallet_balance_cents
        "#,
    )
    .bind(amount_cents)
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(new_balance)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_customer(card_uid: &str, email: &str) -> NewCustomer {
        NewCustomer {
            card_uid: card_uid.to_string(),
            full_name: "Test Customer".to_string(),
            email: email.to_string(),
            password_hash: "$2b$10$hash".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_card_uid() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo
            .create(new_customer("CARD001", "a@example.com"))
            .await
            .unwrap();
        assert_eq!(created.wallet_balance_cents, 0);

        let found = repo.get_by_card_uid("CARD001").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.get_by_card_uid("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_card_uid_is_distinguishable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.create(new_customer("CARD001", "a@example.com"))
            .await
            .unwrap();
        let err = repo
            .create(new_customer("CARD001", "b@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_distinguishable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.create(new_customer("CARD001", "a@example.com"))
            .await
            .unwrap();
        let err = repo
            .create(new_customer("CARD002", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_credit_then_checked_debit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        let c = repo
            .create(new_customer("CARD001", "a@example.com"))
            .await
            .unwrap();

        assert_eq!(repo.credit_balance(&c.id, 5000).await.unwrap(), 5000);

        let debited = repo.debit_balance_checked(&c.id, 1500).await.unwrap();
        assert_eq!(debited, Some(3500));

        // Debit beyond the balance leaves it untouched
        let refused = repo.debit_balance_checked(&c.id, 9999).await.unwrap();
        assert_eq!(refused, None);
        assert_eq!(repo.fetch_balance(&c.id).await.unwrap(), 3500);
    }

    #[tokio::test]
    async fn test_fetch_balance_missing_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.customers().fetch_balance("ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
