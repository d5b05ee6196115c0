//! # Product Repository
//!
//! Database operations for the RFID-tagged product catalog.
//!
//! ## Stock Mutations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Decrement Variants                             │
//! │                                                                         │
//! │  decrement_stock (trusting policy - matches the original kiosk)       │
//! │    UPDATE products SET stock_quantity = stock_quantity - ?qty          │
//! │    WHERE id = ?                                                         │
//! │    → may drive stock negative; quantity is trusted from the request    │
//! │                                                                         │
//! │  decrement_stock_checked (strict policy)                               │
//! │    UPDATE products SET stock_quantity = stock_quantity - ?qty          │
//! │    WHERE id = ? AND stock_quantity >= ?qty                             │
//! │    → zero rows affected means insufficient stock                       │
//! │                                                                         │
//! │  Either way the mutation is one atomic statement, safe under           │
//! │  concurrent checkouts of the same product.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tappos_core::Product;

/// Fields required to create a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub rfid_uid: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub stock_quantity: i64,
    pub category: String,
    pub image_url: Option<String>,
}

/// Admin-editable product fields.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub unit_price_cents: i64,
    pub stock_quantity: i64,
    pub category: String,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "id, rfid_uid, name, unit_price_cents, \
     stock_quantity, category, image_url, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product. A duplicate tag UID surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            rfid_uid: new.rfid_uid,
            name: new.name,
            unit_price_cents: new.unit_price_cents,
            stock_quantity: new.stock_quantity,
            category: new.category,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, rfid_uid = %product.rfid_uid, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, rfid_uid, name, unit_price_cents,
                stock_quantity, category, image_url, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.rfid_uid)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(product.stock_quantity)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies an admin edit to a product.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                unit_price_cents = ?3,
                stock_quantity = ?4,
                category = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.unit_price_cents)
        .bind(update.stock_quantity)
        .bind(&update.category)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product from the catalog.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists the full catalog, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by the UID of its RFID tag.
    ///
    /// The router's second lookup, after the customer check misses.
    pub async fn get_by_rfid_uid(&self, rfid_uid: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE rfid_uid = ?1"
        ))
        .bind(rfid_uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Atomically decrements stock without a sufficiency check
    /// (trusting policy).
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        decrement_stock_on(&self.pool, id, quantity).await
    }

    /// Atomically decrements stock only if enough is on hand.
    ///
    /// ## Returns
    /// `true` when the decrement landed, `false` on shortfall.
    pub async fn decrement_stock_checked(&self, id: &str, quantity: i64) -> DbResult<bool> {
        decrement_stock_checked_on(&self.pool, id, quantity).await
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Unconditional stock decrement inside an open settlement transaction.
pub async fn decrement_stock_tx(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<()> {
    decrement_stock_on(conn, id, quantity).await
}

/// Reads current stock inside an open settlement transaction.
///
/// Used after a checked decrement refuses, to report the shortfall
/// without acquiring a second pool connection.
pub async fn fetch_stock_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<i64>> {
    let stock: Option<i64> =
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(stock)
}

/// Checked stock decrement inside an open settlement transaction.
pub async fn decrement_stock_checked_tx(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<bool> {
    decrement_stock_checked_on(conn, id, quantity).await
}

async fn decrement_stock_on<'e, E>(executor: E, id: &str, quantity: i64) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    debug!(product_id = %id, quantity, "Decrementing stock");

    let result = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - ?1 WHERE id = ?2",
    )
    .bind(quantity)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

async fn decrement_stock_checked_on<'e, E>(executor: E, id: &str, quantity: i64) -> DbResult<bool>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    debug!(product_id = %id, quantity, "Decrementing stock (checked)");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?1
        WHERE id = ?2 AND stock_quantity >= ?1
        "#,
    )
    .bind(quantity)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sandwich() -> NewProduct {
        NewProduct {
            rfid_uid: "TAG002".to_string(),
            name: "Sandwich".to_string(),
            unit_price_cents: 1500,
            stock_quantity: 20,
            category: "Food".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_tag() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.create(sandwich()).await.unwrap();
        let found = repo.get_by_rfid_uid("TAG002").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.unit_price_cents, 1500);
    }

    #[tokio::test]
    async fn test_duplicate_tag_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.create(sandwich()).await.unwrap();
        let err = repo.create(sandwich()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_trusting_decrement_can_go_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = repo.create(sandwich()).await.unwrap();

        repo.decrement_stock(&p.id, 25).await.unwrap();
        let after = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, -5);
    }

    #[tokio::test]
    async fn test_checked_decrement_refuses_shortfall() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = repo.create(sandwich()).await.unwrap();

        assert!(repo.decrement_stock_checked(&p.id, 20).await.unwrap());
        assert!(!repo.decrement_stock_checked(&p.id, 1).await.unwrap());

        let after = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = repo.create(sandwich()).await.unwrap();

        repo.update(
            &p.id,
            ProductUpdate {
                name: "Club Sandwich".to_string(),
                unit_price_cents: 1800,
                stock_quantity: 10,
                category: "Food".to_string(),
            },
        )
        .await
        .unwrap();

        let after = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.name, "Club Sandwich");
        assert_eq!(after.unit_price_cents, 1800);

        repo.delete(&p.id).await.unwrap();
        assert!(repo.get_by_id(&p.id).await.unwrap().is_none());

        let err = repo.delete(&p.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
