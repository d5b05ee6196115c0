//! # Domain Types
//!
//! Core domain types used throughout TapPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │    Product      │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  card_uid       │   │  rfid_uid       │   │  customer_id    │       │
//! │  │  wallet_balance │   │  unit_price     │   │  total_cents    │       │
//! │  │  is_admin       │   │  stock_quantity │   │  status: Paid   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionItem │   │     TopUp       │   │   ScanResult    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price snapshot │   │  append-only    │   │  Customer /     │       │
//! │  │  at sale time   │   │  audit record   │   │  Product /      │       │
//! │  │                 │   │                 │   │  Unregistered   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Physical ID: (card_uid, rfid_uid) - what the RFID reader sees

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Customer
// =============================================================================

/// A registered customer carrying a balance-bearing RFID card.
///
/// `wallet_balance_cents` is mutated only by the settlement engine
/// (debit) and the top-up ledger (credit), and only via store-level
/// atomic deltas. It must never go negative after a committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// UID of the physical RFID card. Unique across customers.
    pub card_uid: String,

    /// Display name shown on dashboards and receipts.
    pub full_name: String,

    /// Login email. Unique across customers.
    pub email: String,

    /// Opaque password hash. Hashing mechanics live outside this system;
    /// the column exists so the auth layer has somewhere to put it.
    pub password_hash: String,

    /// Current wallet balance in cents.
    pub wallet_balance_cents: i64,

    /// Whether this customer may perform admin operations (top-ups,
    /// catalog edits). Card-identified checkouts are always non-admin.
    pub is_admin: bool,

    /// When the customer registered.
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the wallet balance as a Money type.
    #[inline]
    pub fn wallet_balance(&self) -> Money {
        Money::from_cents(self.wallet_balance_cents)
    }

    /// Returns the public projection safe to put on the wire.
    pub fn card_view(&self) -> CustomerCard {
        CustomerCard {
            id: self.id.clone(),
            card_uid: self.card_uid.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            wallet_balance_cents: self.wallet_balance_cents,
        }
    }
}

/// Public projection of a customer for scan broadcasts.
///
/// ## Why a projection?
/// Scan results are fanned out to every connected dashboard. The
/// password hash and admin flag never leave the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCard {
    pub id: String,
    pub card_uid: String,
    pub full_name: String,
    pub email: String,
    pub wallet_balance_cents: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A product carrying an RFID tag, available for sale at the kiosk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// UID of the RFID tag attached to the product. Unique.
    pub rfid_uid: String,

    /// Display name.
    pub name: String,

    /// Price in cents.
    pub unit_price_cents: i64,

    /// Current stock level. Decremented by the settlement engine.
    pub stock_quantity: i64,

    /// Catalog category (Drink, Food, Electronics, ...).
    pub category: String,

    /// Optional product image for dashboards.
    pub image_url: Option<String>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Checks whether the requested quantity is in stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// The status of a settled transaction.
///
/// ## Why only `Paid`?
/// Transactions that reach persistence are definitionally successful:
/// a failed checkout attempt produces no transaction row at all, so
/// there is no partial-then-updated lifecycle to clean up. `Failed`
/// exists for the degraded sequential path, where an orphaned row may
/// be reconciled by hand (see the settlement engine docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Checkout settled; wallet debited, stock decremented.
    Paid,
    /// Reserved for manual reconciliation of degraded-mode orphans.
    Failed,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Paid
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A settled checkout. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// One distinct cart line of a settled transaction.
///
/// ## Snapshot Pattern
/// `unit_price_cents` is captured at sale time and is never re-derived
/// from the product's current price. Editing a product after a sale
/// must not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Admin history row: a transaction joined with its customer name and
/// an aggregated items summary ("1x item, 2x item").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionSummary {
    pub id: String,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub status: TransactionStatus,
    pub items_summary: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Top-Up
// =============================================================================

/// Append-only audit record of a wallet credit.
///
/// Causally paired 1:1 with a balance increment. A missing audit row is
/// a data-quality defect, not a balance-correctness defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopUp {
    pub id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    /// How the credit was made ("Dashboard", "Kiosk", ...).
    pub method: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Scan Classification
// =============================================================================

/// The outcome of classifying a raw tag UID.
///
/// ## Classification Priority
/// Customer identity takes priority over product identity: if a UID
/// were ever reused across both sets, the scan classifies as a
/// customer. The router must check customers first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanResult {
    /// The UID belongs to a registered customer card.
    Customer {
        uid: String,
        customer: CustomerCard,
    },
    /// The UID belongs to a product tag.
    Product { uid: String, product: Product },
    /// The UID matches nothing we know (or the store was unreachable).
    Unregistered { uid: String },
}

impl ScanResult {
    /// Returns the scanned UID regardless of classification.
    pub fn uid(&self) -> &str {
        match self {
            ScanResult::Customer { uid, .. } => uid,
            ScanResult::Product { uid, .. } => uid,
            ScanResult::Unregistered { uid } => uid,
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// One line of a checkout cart as presented by the kiosk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product being purchased (UUID, not the RFID UID).
    pub product_id: String,

    /// Units requested. Must be positive.
    pub quantity: i64,

    /// Unit price as quoted to the customer, in cents. Snapshotted
    /// onto the transaction item.
    pub unit_price_cents: i64,
}

impl CartLine {
    /// Line total in cents.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A checkout request at the engine boundary.
///
/// ## Identification Priority
/// A presented `card_uid` wins over `session_customer_id` — the
/// "tap card to pay" path works without a prior login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Card UID presented with the request, if the customer tapped.
    pub card_uid: Option<String>,

    /// Authenticated session identity, if logged in.
    pub session_customer_id: Option<String>,

    /// Cart lines.
    pub cart: Vec<CartLine>,

    /// Caller-computed total in cents. Compared against the wallet
    /// balance as given; reconciliation against line totals is a
    /// configuration choice.
    pub total_cents: i64,
}

/// Successful checkout outcome returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub transaction_id: String,
    pub new_balance_cents: i64,
    pub customer_name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_customer() -> Customer {
        Customer {
            id: "c-1".to_string(),
            card_uid: "CARD001".to_string(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            wallet_balance_cents: 5000,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_view_hides_secrets() {
        let view = sample_customer().card_view();
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("is_admin"));
        assert!(json.contains("CARD001"));
    }

    #[test]
    fn test_scan_result_serializes_with_type_tag() {
        let result = ScanResult::Unregistered {
            uid: "X".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "unregistered");
        assert_eq!(json["uid"], "X");
    }

    #[test]
    fn test_scan_result_uid_accessor() {
        let result = ScanResult::Customer {
            uid: "CARD001".to_string(),
            customer: sample_customer().card_view(),
        };
        assert_eq!(result.uid(), "CARD001");
    }

    #[test]
    fn test_cart_line_total() {
        let line = CartLine {
            product_id: "p-1".to_string(),
            quantity: 3,
            unit_price_cents: 700,
        };
        assert_eq!(line.line_total().cents(), 2100);
    }
}
