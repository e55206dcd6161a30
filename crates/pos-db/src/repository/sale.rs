//! # Sale Repository
//!
//! Database operations for committed sales.
//!
//! ## Append-Only Audit Trail
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  There isn't one. A sale row is written exactly once, inside the        │
//! │  checkout transaction, and is never updated or deleted afterwards.      │
//! │                                                                         │
//! │  CheckoutProcessor ──► insert_sale_tx                                   │
//! │                    ──► insert_item_tx (×N, with price snapshots)        │
//! │                    ──► insert_applied_discount_tx (×M)                  │
//! │                    ──► COMMIT                                           │
//! │                                                                         │
//! │  Everything after commit is read-only: get / list / reports.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use pos_core::pricing::DiscountApplication;
use pos_core::{AppliedDiscount, Money, PaymentMethod, Sale, SaleItem};

const SALE_COLUMNS: &str = "id, user_id, customer_id, total_cents AS total_amount, \
     final_cents AS final_amount, payment_method, transaction_time";

const ITEM_COLUMNS: &str = "sale_id, product_id, quantity, \
     unit_price_cents AS unit_price, sku_snapshot, name_snapshot";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, with its items loaded.
    pub async fn get(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut sale) = sale else {
            return Ok(None);
        };

        sale.items = self.get_items(id).await?;
        Ok(Some(sale))
    }

    /// Lists all sales, newest first. Items are not loaded.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY transaction_time DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets all items for a sale, ascending by product id.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY product_id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the discount audit rows for a sale.
    pub async fn get_applied_discounts(&self, sale_id: i64) -> DbResult<Vec<AppliedDiscount>> {
        let applied = sqlx::query_as::<_, AppliedDiscount>(
            "SELECT sale_id, discount_id, code_snapshot, \
             amount_discounted_cents AS amount_discounted \
             FROM applied_discounts WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(applied)
    }

    /// Inserts the sale row inside the checkout transaction.
    ///
    /// ## Returns
    /// The assigned sale id.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn insert_sale_tx(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        customer_id: Option<i64>,
        total_amount: Money,
        final_amount: Money,
        payment_method: PaymentMethod,
        transaction_time: DateTime<Utc>,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (user_id, customer_id, total_cents, final_cents, payment_method, transaction_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(user_id)
        .bind(customer_id)
        .bind(total_amount.cents())
        .bind(final_amount.cents())
        .bind(payment_method)
        .bind(transaction_time)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        let sale_id = result.last_insert_rowid();
        debug!(sale_id, "Sale row inserted");
        Ok(sale_id)
    }

    /// Inserts one sale item inside the checkout transaction.
    ///
    /// Product sku, name, and unit price arrive already snapshotted so the
    /// row stays meaningful after later catalog edits.
    pub(crate) async fn insert_item_tx(
        tx: &mut Transaction<'_, Sqlite>,
        item: &SaleItem,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, unit_price_cents, sku_snapshot, name_snapshot)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(item.sale_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price.cents())
        .bind(&item.sku_snapshot)
        .bind(&item.name_snapshot)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    /// Inserts one discount audit row inside the checkout transaction.
    pub(crate) async fn insert_applied_discount_tx(
        tx: &mut Transaction<'_, Sqlite>,
        sale_id: i64,
        application: &DiscountApplication,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO applied_discounts (sale_id, discount_id, code_snapshot, amount_discounted_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(sale_id)
        .bind(application.discount_id)
        .bind(&application.code)
        .bind(application.amount.cents())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
// Insert paths are exercised end-to-end through the checkout processor's
// tests; here we cover the read side against hand-inserted rows.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn insert_sale(db: &Database, final_cents: i64) -> i64 {
        let mut tx = db.pool().begin().await.unwrap();
        let sale_id = SaleRepository::insert_sale_tx(
            &mut tx,
            1,
            None,
            Money::from_cents(final_cents),
            Money::from_cents(final_cents),
            PaymentMethod::Cash,
            Utc::now(),
        )
        .await
        .unwrap();

        SaleRepository::insert_item_tx(
            &mut tx,
            &SaleItem {
                sale_id,
                product_id: 7,
                quantity: 2,
                unit_price: Money::from_cents(final_cents / 2),
                sku_snapshot: "SKU-7".to_string(),
                name_snapshot: "Widget".to_string(),
            },
        )
        .await
        .unwrap();

        tx.commit().await.unwrap();
        sale_id
    }

    #[tokio::test]
    async fn test_get_with_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale_id = insert_sale(&db, 1000).await;

        let sale = db.sales().get(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.final_amount, Money::from_cents(1000));
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].name_snapshot, "Widget");

        assert!(db.sales().get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = insert_sale(&db, 1000).await;
        let second = insert_sale(&db, 2000).await;

        let sales = db.sales().list().await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].id, second);
        assert_eq!(sales[1].id, first);
    }
}
