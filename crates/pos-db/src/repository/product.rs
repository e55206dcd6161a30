//! # Product Repository
//!
//! Database operations for the product catalog - the single source of truth
//! for stock levels.
//!
//! ## Stock Deduction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Conditional Decrement Strategy                          │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (races under concurrency)                   │
//! │     SELECT quantity ... ; if enough: UPDATE ... SET quantity = n       │
//! │     Two checkouts can both read 5, both "succeed", stock goes -1       │
//! │                                                                         │
//! │  ✅ CORRECT: single conditional statement                              │
//! │     UPDATE products SET quantity = quantity - ?                        │
//! │     WHERE id = ? AND quantity >= ?                                     │
//! │                                                                         │
//! │  rows_affected = 0 means the guard failed: either the product is       │
//! │  gone, or stock is short. The caller's transaction rolls back, so a    │
//! │  multi-line cart deducts all lines or none.                            │
//! │                                                                         │
//! │  Lines arrive ascending by product_id (Cart normalization), so all     │
//! │  concurrent carts take row locks in the same order.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::checkout::CheckoutError;
use crate::error::{DbError, DbResult};
use pos_core::{CartLine, Money, Product};

/// Columns for mapping rows into [`Product`].
/// `price_cents` is aliased so the cents column decodes into the Money field.
const PRODUCT_COLUMNS: &str =
    "id, sku, name, description, price_cents AS price, quantity, created_at, updated_at";

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub quantity: i64,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create(new_product).await?;
/// let all = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, spec: NewProduct) -> DbResult<Product> {
        debug!(sku = %spec.sku, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (sku, name, description, price_cents, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&spec.sku)
        .bind(&spec.name)
        .bind(&spec.description)
        .bind(spec.price.cents())
        .bind(spec.quantity)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &spec.sku),
            other => other,
        })?;

        let id = result.last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Applies a partial update to an existing product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - New SKU collides
    pub async fn update(&self, id: i64, patch: ProductPatch) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = COALESCE(?2, sku),
                name = COALESCE(?3, name),
                description = COALESCE(?4, description),
                price_cents = COALESCE(?5, price_cents),
                quantity = COALESCE(?6, quantity),
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.sku)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.quantity)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("sku", patch.sku.as_deref().unwrap_or("unknown"))
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Historical sale items keep their snapshots and product_id (weak
    /// reference), so past sales and reports are unaffected.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomically deducts stock for every line, or none.
    ///
    /// Either every line's stock is sufficient and all are deducted
    /// together, or the transaction rolls back and the failing product is
    /// reported. Stock changes become visible to readers only after commit.
    ///
    /// ## Arguments
    /// * `lines` - deduction lines, ascending by product_id
    pub async fn reserve_and_deduct(&self, lines: &[CartLine]) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        Self::deduct_lines_tx(&mut tx, lines).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    /// The deduction loop, inside a caller-owned transaction.
    ///
    /// Used by the checkout processor so the deduction commits together
    /// with the sale rows. On error the caller drops the transaction,
    /// rolling back any lines already deducted.
    pub(crate) async fn deduct_lines_tx(
        tx: &mut Transaction<'_, Sqlite>,
        lines: &[CartLine],
    ) -> Result<(), CheckoutError> {
        let now = Utc::now();

        for line in lines {
            // Deduct only if the remaining stock covers the request
            let result = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - ?1, updated_at = ?3
                WHERE id = ?2 AND quantity >= ?1
                "#,
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                // Guard failed: missing product or short stock
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
                        .bind(line.product_id)
                        .fetch_optional(&mut **tx)
                        .await
                        .map_err(DbError::from)?;

                return Err(match available {
                    None => CheckoutError::ProductNotFound(line.product_id),
                    Some(available) => CheckoutError::InsufficientStock {
                        product_id: line.product_id,
                        available,
                        requested: line.quantity,
                    },
                });
            }

            debug!(
                product_id = line.product_id,
                deducted = line.quantity,
                "Stock deducted"
            );
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
