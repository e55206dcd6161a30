//! Credential and session module.
//!
//! The explicit session/credential capability that fronts the engine:
//! passwords are hashed with Argon2 at registration, verified at login, and
//! a successful login issues a JWT. The transaction engine itself never sees
//! a credential - it only ever receives an authenticated `user_id`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a raw password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            ApiError::internal("Failed to process credentials")
        })
}

/// Verifies a raw password against a stored Argon2 hash.
///
/// A malformed stored hash verifies as false rather than erroring; the
/// caller can't do anything better with it, and login failures must not
/// leak which part failed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// JWT Sessions
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, stringified)
    pub sub: String,

    /// Username at login time
    pub username: String,

    /// Role at login time
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generate a session token for a logged-in user.
    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Token generation failed");
            ApiError::internal("Failed to generate session token")
        })
    }

    /// Validate and decode a session token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ApiError::unauthorized("Invalid or expired session token"))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from an authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct-horse-battery").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse-battery", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_token(42, "alice", "cashier").unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "cashier");
    }

    #[test]
    fn test_jwt_wrong_secret_rejected() {
        let manager = JwtManager::new("secret-a".to_string(), 3600);
        let other = JwtManager::new("secret-b".to_string(), 3600);

        let token = manager.generate_token(1, "alice", "cashier").unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
