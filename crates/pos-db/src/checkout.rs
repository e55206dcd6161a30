//! # Checkout Processor
//!
//! The concurrency-critical heart of the engine: turns a cart plus optional
//! discount codes into a durable sale while deducting stock, all-or-nothing.
//!
//! ## State Machine (terminal in one round trip)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Stages                                   │
//! │                                                                         │
//! │  Received                                                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Validating ── empty cart ───────────────► Failed (EmptyCart)          │
//! │     │       ── unknown product ──────────► Failed (ProductNotFound)    │
//! │     │       ── bad discount code ────────► Failed (InvalidDiscount)    │
//! │     ▼                                                                   │
//! │  Pricing (pure, optimistic price snapshot, NO locks held)              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Committing (ONE transaction):                                         │
//! │     conditional stock decrement per line, ascending product_id         │
//! │        │── any line short ───────────────► Failed (InsufficientStock)  │
//! │        │                                   (rollback: nothing deducted,│
//! │        │                                    no sale row exists)        │
//! │     insert sale + items + applied discounts                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Committed ──► { sale_id }                                             │
//! │                                                                         │
//! │  Failure at ANY stage leaves stock untouched and writes no sale.       │
//! │  SQLITE_BUSY contention inside Committing is retried transparently;    │
//! │  contention alone never fails a checkout. Each accepted request        │
//! │  commits at most once.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::DbError;
use crate::repository::discount::DiscountRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use pos_core::pricing::{price_cart, PricedLine, Quote};
use pos_core::{Cart, CartLine, CoreError, Discount, Money, PaymentMethod, Product, SaleItem, ValidationError};

/// Bounded retries for write-lock contention during commit.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

// =============================================================================
// Request / Response
// =============================================================================

/// One checkout request, as submitted by the client.
///
/// `user_id` is the already-authenticated cashier; the engine does not
/// validate identity itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: i64,
    pub customer_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub discount_codes: Vec<String>,
}

/// The result of a committed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub sale_id: i64,
    pub total_amount: Money,
    pub final_amount: Money,
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Everything that can abort a checkout.
///
/// Message text is part of the client contract (displayed raw), so keep it
/// stable and human-readable.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart had no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Too many distinct products in one cart.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// A cart line references a product that doesn't exist.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// A discount code is unknown, inactive, or expired.
    /// The whole sale is rejected; codes are never silently dropped.
    #[error("Invalid discount code: {0}")]
    InvalidDiscount(String),

    /// A line asked for more units than are on hand.
    /// Reported for the first short line; nothing was deducted.
    #[error("Not enough stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Malformed input (bad quantity, etc.).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failure; details are logged, not leaked.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => CheckoutError::EmptyCart,
            CoreError::CartTooLarge { max } => CheckoutError::CartTooLarge { max },
            CoreError::Validation(e) => CheckoutError::Validation(e),
        }
    }
}

// =============================================================================
// Checkout Processor
// =============================================================================

/// The sale transaction processor.
///
/// Stateless besides the pool; safe to use from concurrently running
/// handlers. All exclusivity lives in the commit transaction.
#[derive(Debug, Clone)]
pub struct CheckoutProcessor {
    products: ProductRepository,
    discounts: DiscountRepository,
    pool: SqlitePool,
}

impl CheckoutProcessor {
    /// Creates a new CheckoutProcessor over the shared pool.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutProcessor {
            products: ProductRepository::new(pool.clone()),
            discounts: DiscountRepository::new(pool.clone()),
            pool,
        }
    }

    /// Runs one checkout to completion.
    ///
    /// See the module diagram for the stage flow. On success the sale id is
    /// returned; on any failure stock is untouched and no sale exists.
    pub async fn process(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, CheckoutError> {
        // ---- Validating ----------------------------------------------------
        let cart = Cart::new(request.lines.clone())?;

        let products = self.load_products(&cart).await?;

        let now = Utc::now();
        let mut discounts: Vec<Discount> = Vec::with_capacity(request.discount_codes.len());
        for code in &request.discount_codes {
            discounts.push(self.discounts.resolve(code, now).await?);
        }

        // ---- Pricing -------------------------------------------------------
        // Optimistic price snapshot: prices were read above without locks;
        // the same snapshot is persisted into the sale items below.
        let priced: Vec<PricedLine> = cart
            .lines()
            .iter()
            .zip(&products)
            .map(|(line, product)| PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: product.price,
            })
            .collect();

        let quote = price_cart(&priced, &discounts);

        // ---- Committing ----------------------------------------------------
        // Only write contention is retried; domain failures are final.
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.commit(&request, &cart, &products, &quote).await {
                Err(CheckoutError::Db(e)) if e.is_busy() && attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(attempt, "Checkout commit contended, retrying");
                    tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
                }
                Ok(sale_id) => {
                    info!(
                        sale_id,
                        user_id = request.user_id,
                        lines = cart.len(),
                        total = %quote.total_amount,
                        final_total = %quote.final_amount,
                        "Checkout committed"
                    );
                    return Ok(CheckoutReceipt {
                        sale_id,
                        total_amount: quote.total_amount,
                        final_amount: quote.final_amount,
                    });
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Resolves every cart line to a product, failing on the first miss.
    ///
    /// Returned in cart-line order (ascending product_id).
    async fn load_products(&self, cart: &Cart) -> Result<Vec<Product>, CheckoutError> {
        let mut products = Vec::with_capacity(cart.len());
        for line in cart.lines() {
            let product = self
                .products
                .get(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
            products.push(product);
        }
        Ok(products)
    }

    /// The Committing stage: one transaction covering stock deduction and
    /// all sale rows. Dropping the transaction on any error rolls the whole
    /// thing back.
    async fn commit(
        &self,
        request: &CheckoutRequest,
        cart: &Cart,
        products: &[Product],
        quote: &Quote,
    ) -> Result<i64, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        ProductRepository::deduct_lines_tx(&mut tx, cart.lines()).await?;

        let sale_id = SaleRepository::insert_sale_tx(
            &mut tx,
            request.user_id,
            request.customer_id,
            quote.total_amount,
            quote.final_amount,
            request.payment_method,
            Utc::now(),
        )
        .await?;

        for (line, product) in cart.lines().iter().zip(products) {
            let item = SaleItem {
                sale_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: product.price,
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
            };
            SaleRepository::insert_item_tx(&mut tx, &item).await?;
        }

        for application in &quote.applied_discounts {
            SaleRepository::insert_applied_discount_tx(&mut tx, sale_id, application).await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(sale_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::discount::NewDiscount;
    use crate::repository::product::{NewProduct, ProductPatch};
    use pos_core::DiscountKind;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, sku: &str, price_cents: i64, quantity: i64) -> Product {
        db.products()
            .create(NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                description: None,
                price: Money::from_cents(price_cents),
                quantity,
            })
            .await
            .unwrap()
    }

    async fn seed_discount(db: &Database, code: &str, kind: DiscountKind, value: i64) {
        db.discounts()
            .create(NewDiscount {
                code: code.to_string(),
                description: None,
                kind,
                value,
                is_active: true,
                valid_from: None,
                valid_until: None,
            })
            .await
            .unwrap();
    }

    fn request(product_id: i64, quantity: i64) -> CheckoutRequest {
        CheckoutRequest {
            user_id: 1,
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            lines: vec![CartLine {
                product_id,
                quantity,
            }],
            discount_codes: vec![],
        }
    }

    /// The end-to-end scenario: stock 5, sell 3 at $10.00, then fail to
    /// sell 3 more.
    #[tokio::test]
    async fn test_checkout_end_to_end() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let receipt = db.checkout().process(request(product.id, 3)).await.unwrap();
        assert_eq!(receipt.total_amount, Money::from_cents(3000));
        assert_eq!(receipt.final_amount, Money::from_cents(3000));

        // Stock deducted, sale durable with snapshots
        let after = db.products().get(product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 2);

        let sale = db.sales().get(receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.final_amount, Money::from_cents(3000));
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].unit_price, Money::from_cents(1000));
        assert_eq!(sale.items[0].quantity, 3);

        // Second checkout for 3 must fail; stock stays at 2, no new sale
        let err = db.checkout().process(request(product.id, 3)).await.unwrap_err();
        match err {
            CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, product.id);
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(
            db.products().get(product.id).await.unwrap().unwrap().quantity,
            2
        );
        assert_eq!(db.sales().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_no_side_effects() {
        let db = test_db().await;
        seed_product(&db, "P-1", 1000, 5).await;

        let err = db
            .checkout()
            .process(CheckoutRequest {
                user_id: 1,
                customer_id: None,
                payment_method: PaymentMethod::Cash,
                lines: vec![],
                discount_codes: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(err.to_string(), "Cart is empty");
        assert!(db.sales().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = test_db().await;
        let err = db.checkout().process(request(404, 1)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(404)));
        assert!(db.sales().list().await.unwrap().is_empty());
    }

    /// A cart mixing one satisfiable line with one short line deducts
    /// neither and writes nothing.
    #[tokio::test]
    async fn test_mixed_cart_is_all_or_nothing() {
        let db = test_db().await;
        let a = seed_product(&db, "A", 1000, 10).await;
        let b = seed_product(&db, "B", 1000, 1).await;

        let err = db
            .checkout()
            .process(CheckoutRequest {
                user_id: 1,
                customer_id: None,
                payment_method: PaymentMethod::Cash,
                lines: vec![
                    CartLine {
                        product_id: a.id,
                        quantity: 2,
                    },
                    CartLine {
                        product_id: b.id,
                        quantity: 3,
                    },
                ],
                discount_codes: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        assert_eq!(db.products().get(a.id).await.unwrap().unwrap().quantity, 10);
        assert_eq!(db.products().get(b.id).await.unwrap().unwrap().quantity, 1);
        assert!(db.sales().list().await.unwrap().is_empty());
    }

    /// An invalid code aborts the sale entirely; it is never priced without
    /// the code.
    #[tokio::test]
    async fn test_invalid_discount_aborts_whole_sale() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let mut req = request(product.id, 1);
        req.discount_codes = vec!["BOGUS".to_string()];

        let err = db.checkout().process(req).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidDiscount(code) if code == "BOGUS"));

        assert_eq!(
            db.products().get(product.id).await.unwrap().unwrap().quantity,
            5
        );
        assert!(db.sales().list().await.unwrap().is_empty());
    }

    /// Discount codes apply in request order; both orders of the same
    /// two-code cart are pinned, including the audit rows.
    #[tokio::test]
    async fn test_discount_codes_apply_in_request_order() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 100).await;
        seed_discount(&db, "TEN_PCT", DiscountKind::Percentage, 1000).await;
        seed_discount(&db, "FIVE_OFF", DiscountKind::FixedAmount, 500).await;

        // $100 cart, [10%, $5] → $85.00
        let mut req = request(product.id, 10);
        req.discount_codes = vec!["TEN_PCT".to_string(), "FIVE_OFF".to_string()];
        let receipt = db.checkout().process(req).await.unwrap();
        assert_eq!(receipt.total_amount, Money::from_cents(10_000));
        assert_eq!(receipt.final_amount, Money::from_cents(8_500));

        let applied = db
            .sales()
            .get_applied_discounts(receipt.sale_id)
            .await
            .unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].code_snapshot, "TEN_PCT");
        assert_eq!(applied[0].amount_discounted, Money::from_cents(1_000));
        assert_eq!(applied[1].code_snapshot, "FIVE_OFF");
        assert_eq!(applied[1].amount_discounted, Money::from_cents(500));

        // Same cart, [$5, 10%] → $85.50
        let mut req = request(product.id, 10);
        req.discount_codes = vec!["FIVE_OFF".to_string(), "TEN_PCT".to_string()];
        let receipt = db.checkout().process(req).await.unwrap();
        assert_eq!(receipt.final_amount, Money::from_cents(8_550));
    }

    /// Later price edits never touch a committed sale (snapshot pattern).
    #[tokio::test]
    async fn test_committed_sale_immutable_under_price_changes() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let receipt = db.checkout().process(request(product.id, 2)).await.unwrap();

        db.products()
            .update(
                product.id,
                ProductPatch {
                    price: Some(Money::from_cents(99_999)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sale = db.sales().get(receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.final_amount, Money::from_cents(2000));
        assert_eq!(sale.items[0].unit_price, Money::from_cents(1000));
    }

    /// Deleting the product afterwards leaves the sale intact too.
    #[tokio::test]
    async fn test_committed_sale_survives_product_delete() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let receipt = db.checkout().process(request(product.id, 1)).await.unwrap();
        db.products().delete(product.id).await.unwrap();

        let sale = db.sales().get(receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.items[0].product_id, product.id);
        assert_eq!(sale.items[0].name_snapshot, "Product P-1");
    }

    /// Stock invariant under concurrent checkouts: with Q units on hand and
    /// N > Q single-unit carts racing, exactly Q succeed and stock lands on
    /// zero - never negative, never oversold.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let db = test_db().await;
        let product = seed_product(&db, "HOT", 500, 5).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let db = db.clone();
            let product_id = product.id;
            handles.push(tokio::spawn(async move {
                db.checkout().process(request(product_id, 1)).await
            }));
        }

        let mut successes = 0;
        let mut stockouts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(CheckoutError::InsufficientStock { .. }) => stockouts += 1,
                Err(other) => panic!("unexpected checkout failure: {other:?}"),
            }
        }

        assert_eq!(successes, 5);
        assert_eq!(stockouts, 5);
        assert_eq!(
            db.products().get(product.id).await.unwrap().unwrap().quantity,
            0
        );
        assert_eq!(db.sales().list().await.unwrap().len(), 5);
    }

    /// Duplicate lines for the same product merge before deduction, so a
    /// split request can't sneak past the stock guard.
    #[tokio::test]
    async fn test_duplicate_lines_merge_before_deduction() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 4).await;

        let err = db
            .checkout()
            .process(CheckoutRequest {
                user_id: 1,
                customer_id: None,
                payment_method: PaymentMethod::Cash,
                lines: vec![
                    CartLine {
                        product_id: product.id,
                        quantity: 3,
                    },
                    CartLine {
                        product_id: product.id,
                        quantity: 3,
                    },
                ],
                discount_codes: vec![],
            })
            .await
            .unwrap_err();

        // 3 + 3 = 6 > 4: rejected as one 6-unit line
        match err {
            CheckoutError::InsufficientStock { requested, .. } => assert_eq!(requested, 6),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(
            db.products().get(product.id).await.unwrap().unwrap().quantity,
            4
        );
    }

    /// A fixed discount larger than the cart clamps the total at zero.
    #[tokio::test]
    async fn test_discount_clamped_at_zero() {
        let db = test_db().await;
        let product = seed_product(&db, "CHEAP", 300, 5).await;
        seed_discount(&db, "BIG", DiscountKind::FixedAmount, 10_000).await;

        let mut req = request(product.id, 1);
        req.discount_codes = vec!["BIG".to_string()];

        let receipt = db.checkout().process(req).await.unwrap();
        assert_eq!(receipt.total_amount, Money::from_cents(300));
        assert_eq!(receipt.final_amount, Money::zero());
    }
}
