//! # Report Repository
//!
//! Read-only aggregation of committed sales into revenue reports.
//!
//! ## Report Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            sales_report(start?, end?)                                   │
//! │                                                                         │
//! │  sales ──────────► total_revenue      = Σ final_amount                  │
//! │    │               total_transactions = COUNT(*)                        │
//! │    │                                                                    │
//! │  sale_items ─────► top_selling_products                                 │
//! │    grouped by product_id                                                │
//! │    total_sold  = Σ quantity                                             │
//! │    total_value = Σ quantity × unit_price                                │
//! │    ORDER BY total_sold DESC, product_id ASC   ← stable tie-break        │
//! │    LIMIT 10                                                             │
//! │                                                                         │
//! │  Date bounds are inclusive calendar days; a missing bound is open.      │
//! │  Both missing = the whole history. An empty range is a zero report,     │
//! │  not an error.                                                          │
//! │                                                                         │
//! │  Product names come from the sale-item snapshots, so products deleted   │
//! │  after the fact still show up in historical reports.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads are plain committed reads; WAL keeps them unblocked by concurrent
//! checkout writes, and a half-committed sale is never visible.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use pos_core::{Money, ProductSales, SalesReport};

/// How many products the top-sellers ranking returns.
const TOP_PRODUCTS_LIMIT: i64 = 10;

/// Read-only sales report aggregator.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds a sales report over an inclusive date range.
    ///
    /// Calling this twice with no intervening sales returns identical
    /// results; the report has no state of its own.
    pub async fn sales_report(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<SalesReport> {
        debug!(?start, ?end, "Building sales report");

        // Inclusive day bounds become a half-open timestamp window:
        // [start 00:00, (end + 1 day) 00:00)
        let lower = start.map(day_start);
        let upper = end.and_then(|d| d.succ_opt()).map(day_start);

        let (total_revenue, total_transactions): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(final_cents), 0), COUNT(id)
            FROM sales
            WHERE (?1 IS NULL OR transaction_time >= ?1)
              AND (?2 IS NULL OR transaction_time < ?2)
            "#,
        )
        .bind(lower)
        .bind(upper)
        .fetch_one(&self.pool)
        .await?;

        let top_selling_products = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                si.product_id                           AS product_id,
                MAX(si.name_snapshot)                   AS product_name,
                SUM(si.quantity)                        AS total_sold,
                SUM(si.quantity * si.unit_price_cents)  AS total_value
            FROM sale_items si
            JOIN sales s ON si.sale_id = s.id
            WHERE (?1 IS NULL OR s.transaction_time >= ?1)
              AND (?2 IS NULL OR s.transaction_time < ?2)
            GROUP BY si.product_id
            ORDER BY total_sold DESC, si.product_id ASC
            LIMIT ?3
            "#,
        )
        .bind(lower)
        .bind(upper)
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesReport {
            start_date: start,
            end_date: end,
            total_revenue: Money::from_cents(total_revenue),
            total_transactions,
            top_selling_products,
        })
    }
}

/// Midnight UTC at the start of the given day.
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::SaleRepository;
    use pos_core::{PaymentMethod, SaleItem};

    /// Inserts a committed sale with chosen totals, item, and timestamp.
    async fn seed_sale(
        db: &Database,
        final_cents: i64,
        product_id: i64,
        quantity: i64,
        unit_cents: i64,
        when: DateTime<Utc>,
    ) -> i64 {
        let mut tx = db.pool().begin().await.unwrap();
        let sale_id = SaleRepository::insert_sale_tx(
            &mut tx,
            1,
            None,
            Money::from_cents(final_cents),
            Money::from_cents(final_cents),
            PaymentMethod::Cash,
            when,
        )
        .await
        .unwrap();

        SaleRepository::insert_item_tx(
            &mut tx,
            &SaleItem {
                sale_id,
                product_id,
                quantity,
                unit_price: Money::from_cents(unit_cents),
                sku_snapshot: format!("SKU-{product_id}"),
                name_snapshot: format!("Product {product_id}"),
            },
        )
        .await
        .unwrap();

        tx.commit().await.unwrap();
        sale_id
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        date(y, m, d)
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[tokio::test]
    async fn test_open_range_covers_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_sale(&db, 1000, 1, 2, 500, at(2026, 1, 10, 9)).await;
        seed_sale(&db, 2000, 2, 1, 2000, at(2026, 3, 5, 17)).await;

        let report = db.reports().sales_report(None, None).await.unwrap();
        assert_eq!(report.total_revenue, Money::from_cents(3000));
        assert_eq!(report.total_transactions, 2);
        assert_eq!(report.top_selling_products.len(), 2);
    }

    #[tokio::test]
    async fn test_bounds_are_inclusive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // One sale late on the end day, one just after midnight on the start day
        seed_sale(&db, 1000, 1, 1, 1000, at(2026, 1, 1, 0)).await;
        seed_sale(&db, 2000, 1, 1, 2000, at(2026, 1, 31, 23)).await;
        // Outside on both sides
        seed_sale(&db, 4000, 1, 1, 4000, at(2025, 12, 31, 23)).await;
        seed_sale(&db, 8000, 1, 1, 8000, at(2026, 2, 1, 0)).await;

        let report = db
            .reports()
            .sales_report(Some(date(2026, 1, 1)), Some(date(2026, 1, 31)))
            .await
            .unwrap();

        assert_eq!(report.total_revenue, Money::from_cents(3000));
        assert_eq!(report.total_transactions, 2);
    }

    #[tokio::test]
    async fn test_half_open_ranges() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_sale(&db, 1000, 1, 1, 1000, at(2026, 1, 15, 12)).await;
        seed_sale(&db, 2000, 1, 1, 2000, at(2026, 2, 15, 12)).await;

        let from_feb = db
            .reports()
            .sales_report(Some(date(2026, 2, 1)), None)
            .await
            .unwrap();
        assert_eq!(from_feb.total_transactions, 1);
        assert_eq!(from_feb.total_revenue, Money::from_cents(2000));

        let until_jan = db
            .reports()
            .sales_report(None, Some(date(2026, 1, 31)))
            .await
            .unwrap();
        assert_eq!(until_jan.total_transactions, 1);
        assert_eq!(until_jan.total_revenue, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn test_empty_range_is_zero_report_not_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_sale(&db, 1000, 1, 1, 1000, at(2026, 1, 15, 12)).await;

        let report = db
            .reports()
            .sales_report(Some(date(2030, 1, 1)), Some(date(2030, 12, 31)))
            .await
            .unwrap();

        assert_eq!(report.total_revenue, Money::zero());
        assert_eq!(report.total_transactions, 0);
        assert!(report.top_selling_products.is_empty());
    }

    #[tokio::test]
    async fn test_ranking_and_tie_break() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // Product 3 sells 5 units; products 1 and 2 sell 2 each (tie)
        seed_sale(&db, 5000, 3, 5, 1000, at(2026, 1, 10, 9)).await;
        seed_sale(&db, 2000, 2, 2, 1000, at(2026, 1, 11, 9)).await;
        seed_sale(&db, 1000, 1, 2, 500, at(2026, 1, 12, 9)).await;

        let report = db.reports().sales_report(None, None).await.unwrap();
        let ids: Vec<i64> = report
            .top_selling_products
            .iter()
            .map(|p| p.product_id)
            .collect();

        // Highest volume first; the 2-unit tie resolves by ascending id
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(report.top_selling_products[0].total_sold, 5);
        assert_eq!(
            report.top_selling_products[0].total_value,
            Money::from_cents(5000)
        );
    }

    #[tokio::test]
    async fn test_report_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_sale(&db, 1500, 1, 3, 500, at(2026, 1, 10, 9)).await;

        let a = db.reports().sales_report(None, None).await.unwrap();
        let b = db.reports().sales_report(None, None).await.unwrap();

        assert_eq!(a.total_revenue, b.total_revenue);
        assert_eq!(a.total_transactions, b.total_transactions);
        assert_eq!(
            a.top_selling_products.len(),
            b.top_selling_products.len()
        );
    }

    #[tokio::test]
    async fn test_deleted_product_still_reported_from_snapshot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_sale(&db, 1000, 42, 1, 1000, at(2026, 1, 10, 9)).await;
        // Product 42 never existed in the catalog (or was deleted since);
        // the snapshot alone carries the report
        let report = db.reports().sales_report(None, None).await.unwrap();
        assert_eq!(report.top_selling_products.len(), 1);
        assert_eq!(report.top_selling_products[0].product_name, "Product 42");
    }
}
