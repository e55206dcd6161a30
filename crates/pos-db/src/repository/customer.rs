//! # Customer Repository
//!
//! CRUD for customers. Customers are optional on a sale; deleting one later
//! leaves historical sales untouched (weak reference).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pos_core::Customer;

const CUSTOMER_COLUMNS: &str = "id, name, phone_number, email, address, created_at";

/// Fields for creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on a duplicate phone number or email.
    pub async fn create(&self, spec: NewCustomer) -> DbResult<Customer> {
        debug!(name = %spec.name, "Inserting customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO customers (name, phone_number, email, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&spec.name)
        .bind(&spec.phone_number)
        .bind(&spec.email)
        .bind(&spec.address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Applies a partial update to a customer.
    pub async fn update(&self, id: i64, patch: CustomerPatch) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = COALESCE(?2, name),
                phone_number = COALESCE(?3, phone_number),
                email = COALESCE(?4, email),
                address = COALESCE(?5, address)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.phone_number)
        .bind(&patch.email)
        .bind(&patch.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}
