//! # Seed Data Generator
//!
//! Populates the database with the demo catalog and an admin customer
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database (./tappos.db)
//! cargo run -p tappos-db --bin seed
//!
//! # Specify database path
//! cargo run -p tappos-db --bin seed -- --db ./data/tappos.db
//! ```
//!
//! ## Generated Data
//! - 15 RFID-tagged products (TAG001..TAG015) across the demo
//!   categories: Drink, Food, Electronics, Clothing, Other
//! - One admin customer with card `ADMIN_CARD`
//!
//! Re-running against an existing database skips records whose tag or
//! card UID already exists, so the seed is idempotent.

use std::env;

use tappos_db::{Database, DbConfig, DbError, NewCustomer, NewProduct};
use tracing::{info, warn};

/// Demo catalog: (tag UID, name, price cents, stock, category).
const PRODUCTS: &[(&str, &str, i64, i64, &str)] = &[
    ("TAG001", "Bottled Water", 500, 50, "Drink"),
    ("TAG002", "Sandwich", 1500, 20, "Food"),
    ("TAG003", "Energy Drink", 1200, 30, "Drink"),
    ("TAG004", "Chocolate Bar", 800, 40, "Food"),
    ("TAG005", "USB-C Cable", 5000, 15, "Electronics"),
    ("TAG006", "Juice Box", 700, 60, "Drink"),
    ("TAG007", "Muffin", 1000, 25, "Food"),
    ("TAG008", "Headphones", 12000, 10, "Electronics"),
    ("TAG009", "T-Shirt", 8000, 30, "Clothing"),
    ("TAG010", "Notebook", 2500, 45, "Other"),
    ("TAG011", "Coffee Cups", 1500, 100, "Other"),
    ("TAG012", "Soda Can", 600, 80, "Drink"),
    ("TAG013", "Banana Pack", 1200, 15, "Food"),
    ("TAG014", "Power Bank", 15000, 5, "Electronics"),
    ("TAG015", "Hoodie", 18000, 12, "Clothing"),
];

#[tokio::main]
async fn main() -> Result<(), DbError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./tappos.db".to_string());
    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let mut inserted = 0usize;
    for (rfid_uid, name, price, stock, category) in PRODUCTS {
        let result = db
            .products()
            .create(NewProduct {
                rfid_uid: rfid_uid.to_string(),
                name: name.to_string(),
                unit_price_cents: *price,
                stock_quantity: *stock,
                category: category.to_string(),
                image_url: None,
            })
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbError::UniqueViolation { .. }) => {
                warn!(tag = rfid_uid, "Product already seeded, skipping")
            }
            Err(e) => return Err(e),
        }
    }
    info!(inserted, total = PRODUCTS.len(), "Products seeded");

    // Admin customer. The placeholder hash is replaced by the auth
    // layer on first password set; this backend never verifies it.
    let admin = db
        .customers()
        .create(NewCustomer {
            card_uid: "ADMIN_CARD".to_string(),
            full_name: "System Admin".to_string(),
            email: "admin@tappos.local".to_string(),
            password_hash: "$2b$10$unset".to_string(),
            is_admin: true,
        })
        .await;

    match admin {
        Ok(c) => info!(email = %c.email, "Admin customer created"),
        Err(DbError::UniqueViolation { .. }) => warn!("Admin customer already seeded, skipping"),
        Err(e) => return Err(e),
    }

    info!("Seed complete");
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}
