//! # User Repository
//!
//! Storage for user accounts. The repository treats `password_hash` as an
//! opaque string; hashing and verification live behind the server's
//! credential layer, never here or in the engine.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pos_core::User;

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

/// Fields for registering a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// Repository for user account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists all users.
    ///
    /// Hashes ride along in the struct but are never serialized.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(users)
    }

    /// Gets a user by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Gets a user by username (for login).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a new user.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the username is taken.
    pub async fn create(&self, spec: NewUser) -> DbResult<User> {
        debug!(username = %spec.username, role = %spec.role, "Inserting user");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&spec.username)
        .bind(&spec.password_hash)
        .bind(&spec.role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", &spec.username),
            other => other,
        })?;

        let id = result.last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes a user.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cashier(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$fake-hash".to_string(),
            role: "cashier".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_db().await;
        let repo = db.users();

        let created = repo.create(cashier("alice")).await.unwrap();
        assert_eq!(created.role, "cashier");

        let by_name = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.password_hash, "$argon2id$fake-hash");

        assert!(repo.get_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = test_db().await;
        let repo = db.users();

        repo.create(cashier("alice")).await.unwrap();
        let err = repo.create(cashier("alice")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(
            err.to_string(),
            "Duplicate username: 'alice' already exists"
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.users();

        let created = repo.create(cashier("gone")).await.unwrap();
        repo.delete(created.id).await.unwrap();

        let err = repo.delete(created.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
