//! # Discount Repository
//!
//! Database operations for discount codes, including checkout-time
//! resolution.
//!
//! ## Resolution Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    resolve("SUMMER10")                                  │
//! │                                                                         │
//! │  Code missing ───────────────┐                                         │
//! │  Code inactive ──────────────┼──► InvalidDiscount("SUMMER10")          │
//! │  Outside validity window ────┘                                         │
//! │                                                                         │
//! │  An invalid code ABORTS the whole checkout. The sale is rejected,      │
//! │  never silently re-priced without the code; the client surfaces        │
//! │  discount errors as checkout failures, not partial successes.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::checkout::CheckoutError;
use crate::error::{DbError, DbResult};
use pos_core::{Discount, DiscountKind};

const DISCOUNT_COLUMNS: &str =
    "id, code, description, kind, value, is_active, valid_from, valid_until, created_at";

/// Fields for creating a discount code.
///
/// `value` uses the internal encoding: basis points for percentage codes,
/// cents for fixed-amount codes.
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub code: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    pub value: i64,
    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct DiscountPatch {
    pub description: Option<String>,
    pub kind: Option<DiscountKind>,
    pub value: Option<i64>,
    pub is_active: Option<bool>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Repository for discount code operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Lists all discount codes.
    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let discounts = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(discounts)
    }

    /// Gets a discount by its ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Gets a discount by its code, redeemable or not.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Resolves a code for checkout at time `now`.
    ///
    /// ## Errors
    /// [`CheckoutError::InvalidDiscount`] when the code is unknown, inactive,
    /// or outside its validity window. The caller aborts the whole sale.
    pub async fn resolve(&self, code: &str, now: DateTime<Utc>) -> Result<Discount, CheckoutError> {
        let discount = self
            .get_by_code(code)
            .await?
            .filter(|d| d.is_redeemable(now));

        match discount {
            Some(d) => Ok(d),
            None => {
                debug!(code = %code, "Discount code rejected");
                Err(CheckoutError::InvalidDiscount(code.to_string()))
            }
        }
    }

    /// Inserts a new discount code.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the code already exists.
    pub async fn create(&self, spec: NewDiscount) -> DbResult<Discount> {
        debug!(code = %spec.code, "Inserting discount");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO discounts (code, description, kind, value, is_active, valid_from, valid_until, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&spec.code)
        .bind(&spec.description)
        .bind(spec.kind)
        .bind(spec.value)
        .bind(spec.is_active)
        .bind(spec.valid_from)
        .bind(spec.valid_until)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &spec.code),
            other => other,
        })?;

        let id = result.last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    /// Applies a partial update to a discount.
    pub async fn update(&self, id: i64, patch: DiscountPatch) -> DbResult<Discount> {
        debug!(id = %id, "Updating discount");

        let result = sqlx::query(
            r#"
            UPDATE discounts SET
                description = COALESCE(?2, description),
                kind = COALESCE(?3, kind),
                value = COALESCE(?4, value),
                is_active = COALESCE(?5, is_active),
                valid_from = COALESCE(?6, valid_from),
                valid_until = COALESCE(?7, valid_until)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.description)
        .bind(patch.kind)
        .bind(patch.value)
        .bind(patch.is_active)
        .bind(patch.valid_from)
        .bind(patch.valid_until)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    /// Deletes a discount code.
    ///
    /// Applied-discount audit rows keep their code snapshot (weak reference).
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting discount");

        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn ten_percent(code: &str) -> NewDiscount {
        NewDiscount {
            code: code.to_string(),
            description: Some("Ten percent off".to_string()),
            kind: DiscountKind::Percentage,
            value: 1000,
            is_active: true,
            valid_from: None,
            valid_until: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let db = test_db().await;
        let repo = db.discounts();

        let created = repo.create(ten_percent("TEN")).await.unwrap();
        assert_eq!(created.kind, DiscountKind::Percentage);
        assert_eq!(created.value, 1000);

        let resolved = repo.resolve("TEN", Utc::now()).await.unwrap();
        assert_eq!(resolved.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let db = test_db().await;
        let repo = db.discounts();

        repo.create(ten_percent("ONCE")).await.unwrap();
        let err = repo.create(ten_percent("ONCE")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let db = test_db().await;
        let err = db.discounts().resolve("NOPE", Utc::now()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidDiscount(code) if code == "NOPE"));
    }

    #[tokio::test]
    async fn test_resolve_inactive_code() {
        let db = test_db().await;
        let repo = db.discounts();

        let mut spec = ten_percent("OFF");
        spec.is_active = false;
        repo.create(spec).await.unwrap();

        let err = repo.resolve("OFF", Utc::now()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidDiscount(_)));
    }

    #[tokio::test]
    async fn test_resolve_expired_code() {
        let db = test_db().await;
        let repo = db.discounts();

        let mut spec = ten_percent("EXPIRED");
        spec.valid_until = Some(Utc::now() - Duration::days(1));
        repo.create(spec).await.unwrap();

        let err = repo.resolve("EXPIRED", Utc::now()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidDiscount(_)));
    }

    #[tokio::test]
    async fn test_update_deactivates() {
        let db = test_db().await;
        let repo = db.discounts();

        let created = repo.create(ten_percent("TOGGLE")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                DiscountPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.is_active);
        assert!(repo.resolve("TOGGLE", Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.discounts();

        let created = repo.create(ten_percent("GONE")).await.unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(repo.get(created.id).await.unwrap().is_none());

        let err = repo.delete(created.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
