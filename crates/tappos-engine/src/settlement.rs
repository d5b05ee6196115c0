//! # Checkout & Balance Settlement Engine
//!
//! Turns a cart plus an identified customer into a settled, persisted
//! transaction.
//!
//! ## Settlement Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Settlement Protocol                                │
//! │                                                                         │
//! │  CheckoutRequest                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. IDENTIFY                                                            │
//! │     card_uid present? ── yes ──► lookup card ── miss ─► CustomerNotFound│
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │     session id present? ── no ──► IdentificationRequired               │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  2. VALIDATE   cart shape, positive total, optional reconcile          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. SUFFICIENCY   fresh balance < total ──► InsufficientBalance        │
//! │       │                                      (nothing mutated)         │
//! │       ▼                                                                 │
//! │  4. SETTLE (atomic mode: one SQLite transaction)                       │
//! │     ├── INSERT transactions (status = 'paid')                          │
//! │     ├── per line: INSERT transaction_items + stock decrement           │
//! │     └── conditional wallet debit (refuses → rollback)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  5. COMMIT, then broadcast "checkout" (best-effort)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutReceipt { transaction_id, new_balance, customer_name }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Debit Is Always Conditional
//! Step 3 reads a fresh balance, but a concurrent spend can land
//! between the check and the debit. The debit statement itself carries
//! the sufficiency predicate, so the committed balance can never go
//! negative; a raced-past check surfaces as `InsufficientBalance` and
//! the transaction rolls back.

use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::broadcast::{Broadcaster, EVENT_CHECKOUT};
use crate::config::{EngineConfig, SettlementMode, StockPolicy, TotalCheck};
use crate::error::{EngineError, EngineResult, SettlementStep};
use tappos_core::validation::{validate_amount, validate_cart, validate_uid};
use tappos_core::{
    CheckoutReceipt, CheckoutRequest, CoreError, Customer, Transaction, TransactionItem,
    TransactionStatus,
};
use tappos_db::repository::customer::debit_balance_checked_tx;
use tappos_db::repository::product::{
    decrement_stock_checked_tx, decrement_stock_tx, fetch_stock_tx,
};
use tappos_db::repository::transaction::{
    generate_item_id, generate_transaction_id, insert_item_tx, insert_tx,
};
use tappos_db::{Database, DbError};

/// The settlement engine.
///
/// Cheap to clone; every kiosk request handler can hold its own copy.
#[derive(Clone)]
pub struct SettlementEngine {
    db: Database,
    broadcaster: Broadcaster,
    config: EngineConfig,
}

impl SettlementEngine {
    /// Creates a new engine over injected collaborators.
    pub fn new(db: Database, broadcaster: Broadcaster, config: EngineConfig) -> Self {
        SettlementEngine {
            db,
            broadcaster,
            config,
        }
    }

    /// Settles a checkout.
    ///
    /// On success every effect has been committed: the transaction and
    /// its line items exist, stock is decremented and the wallet is
    /// debited. On any error under atomic mode, none of them happened.
    pub async fn checkout(&self, request: CheckoutRequest) -> EngineResult<CheckoutReceipt> {
        let customer = self.identify(&request).await?;

        validate_cart(&request.cart)?;
        validate_amount("total_cents", request.total_cents)?;

        if self.config.total_check == TotalCheck::Reconcile {
            let computed: i64 = request.cart.iter().map(|l| l.line_total().cents()).sum();
            if computed != request.total_cents {
                return Err(EngineError::TotalMismatch {
                    supplied_cents: request.total_cents,
                    computed_cents: computed,
                });
            }
        }

        // Friendly pre-check on a fresh balance. The debit below
        // re-checks inside its own statement, so this can only produce
        // false positives, never an overdraft.
        if customer.wallet_balance_cents < request.total_cents {
            info!(
                customer_id = %customer.id,
                balance = customer.wallet_balance_cents,
                total = request.total_cents,
                "Checkout refused, insufficient balance"
            );
            return Err(EngineError::InsufficientBalance);
        }

        let receipt = match self.config.settlement_mode {
            SettlementMode::Atomic => self.settle_atomic(&customer, &request).await?,
            SettlementMode::Sequential => self.settle_sequential(&customer, &request).await?,
        };

        info!(
            transaction_id = %receipt.transaction_id,
            customer_id = %customer.id,
            total = request.total_cents,
            new_balance = receipt.new_balance_cents,
            "Checkout settled"
        );

        self.broadcaster.publish(
            EVENT_CHECKOUT,
            json!({
                "amount_cents": request.total_cents,
                "customer": customer.full_name,
            }),
        );

        Ok(receipt)
    }

    /// Resolves the paying customer.
    ///
    /// A presented card wins over the session identity; "tap card to
    /// pay" needs no prior login. A card that matches nobody is a hard
    /// error, never a fallthrough to the session.
    async fn identify(&self, request: &CheckoutRequest) -> EngineResult<Customer> {
        if let Some(card_uid) = &request.card_uid {
            validate_uid(card_uid)?;
            return match self.db.customers().get_by_card_uid(card_uid).await? {
                Some(customer) => Ok(customer),
                None => Err(EngineError::CustomerNotFound),
            };
        }

        if let Some(customer_id) = &request.session_customer_id {
            return match self.db.customers().get_by_id(customer_id).await? {
                Some(customer) => Ok(customer),
                None => Err(EngineError::IdentificationRequired),
            };
        }

        Err(EngineError::IdentificationRequired)
    }

    // =========================================================================
    // Atomic Settlement
    // =========================================================================

    /// All-or-nothing settlement inside one store transaction.
    async fn settle_atomic(
        &self,
        customer: &Customer,
        request: &CheckoutRequest,
    ) -> EngineResult<CheckoutReceipt> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let transaction = Transaction {
            id: generate_transaction_id(),
            customer_id: customer.id.clone(),
            total_cents: request.total_cents,
            status: TransactionStatus::Paid,
            created_at: Utc::now(),
        };
        insert_tx(&mut tx, &transaction).await?;

        for line in &request.cart {
            insert_item_tx(
                &mut tx,
                &TransactionItem {
                    id: generate_item_id(),
                    transaction_id: transaction.id.clone(),
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    created_at: Utc::now(),
                },
            )
            .await?;

            match self.config.stock_policy {
                StockPolicy::Trusting => {
                    decrement_stock_tx(&mut tx, &line.product_id, line.quantity).await?;
                }
                StockPolicy::Strict => {
                    let landed =
                        decrement_stock_checked_tx(&mut tx, &line.product_id, line.quantity)
                            .await?;
                    if !landed {
                        let available = fetch_stock_tx(&mut tx, &line.product_id)
                            .await?
                            .ok_or_else(|| {
                                EngineError::Core(CoreError::ProductNotFound(
                                    line.product_id.clone(),
                                ))
                            })?;
                        // Dropping the transaction rolls everything back
                        return Err(EngineError::Core(CoreError::InsufficientStock {
                            product: line.product_id.clone(),
                            available,
                            requested: line.quantity,
                        }));
                    }
                }
            }
        }

        let new_balance =
            debit_balance_checked_tx(&mut tx, &customer.id, request.total_cents).await?;
        let Some(new_balance) = new_balance else {
            // A concurrent spend raced past the pre-check
            tx.rollback().await.map_err(DbError::from)?;
            warn!(customer_id = %customer.id, "Debit refused at settle time, rolled back");
            return Err(EngineError::InsufficientBalance);
        };

        tx.commit().await.map_err(DbError::from)?;

        Ok(CheckoutReceipt {
            transaction_id: transaction.id,
            new_balance_cents: new_balance,
            customer_name: customer.full_name.clone(),
        })
    }

    // =========================================================================
    // Sequential Settlement (degraded)
    // =========================================================================

    /// Best-effort settlement without a wrapping store transaction.
    ///
    /// A mid-sequence failure leaves earlier steps committed. Every
    /// such failure is logged with the step name and record ids for
    /// manual reconciliation, surfaced to the caller as
    /// [`EngineError::PartialSettlement`], and never reported as
    /// success.
    async fn settle_sequential(
        &self,
        customer: &Customer,
        request: &CheckoutRequest,
    ) -> EngineResult<CheckoutReceipt> {
        let transaction = Transaction {
            id: generate_transaction_id(),
            customer_id: customer.id.clone(),
            total_cents: request.total_cents,
            status: TransactionStatus::Paid,
            created_at: Utc::now(),
        };
        // Nothing persisted yet, so a failure here is a clean failure
        self.db.transactions().insert(&transaction).await?;

        for line in &request.cart {
            let item = TransactionItem {
                id: generate_item_id(),
                transaction_id: transaction.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                created_at: Utc::now(),
            };
            if let Err(e) = self.db.transactions().insert_item(&item).await {
                return Err(self.partial(
                    SettlementStep::InsertLineItem,
                    &transaction.id,
                    &customer.id,
                    &e,
                ));
            }

            let decremented = match self.config.stock_policy {
                StockPolicy::Trusting => self
                    .db
                    .products()
                    .decrement_stock(&line.product_id, line.quantity)
                    .await
                    .map(|()| true),
                StockPolicy::Strict => self
                    .db
                    .products()
                    .decrement_stock_checked(&line.product_id, line.quantity)
                    .await,
            };
            match decremented {
                Ok(true) => {}
                // Strict shortfall after the transaction row landed
                Ok(false) => {
                    error!(
                        step = %SettlementStep::DecrementStock,
                        transaction_id = %transaction.id,
                        product_id = %line.product_id,
                        "Stock shortfall mid-sequence, settlement incomplete"
                    );
                    return Err(EngineError::PartialSettlement {
                        step: SettlementStep::DecrementStock,
                    });
                }
                Err(e) => {
                    return Err(self.partial(
                        SettlementStep::DecrementStock,
                        &transaction.id,
                        &customer.id,
                        &e,
                    ));
                }
            }
        }

        match self
            .db
            .customers()
            .debit_balance_checked(&customer.id, request.total_cents)
            .await
        {
            Ok(Some(new_balance)) => Ok(CheckoutReceipt {
                transaction_id: transaction.id,
                new_balance_cents: new_balance,
                customer_name: customer.full_name.clone(),
            }),
            Ok(None) => {
                error!(
                    step = %SettlementStep::DebitWallet,
                    transaction_id = %transaction.id,
                    customer_id = %customer.id,
                    "Debit refused mid-sequence, settlement incomplete"
                );
                Err(EngineError::PartialSettlement {
                    step: SettlementStep::DebitWallet,
                })
            }
            Err(e) => Err(self.partial(
                SettlementStep::DebitWallet,
                &transaction.id,
                &customer.id,
                &e,
            )),
        }
    }

    /// Logs a mid-sequence storage failure and builds the caller error.
    fn partial(
        &self,
        step: SettlementStep,
        transaction_id: &str,
        customer_id: &str,
        cause: &DbError,
    ) -> EngineError {
        error!(
            step = %step,
            transaction_id,
            customer_id,
            error = %cause,
            "Sequential settlement failed mid-sequence"
        );
        EngineError::PartialSettlement { step }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
