//! # User Repository
//!
//! Staff accounts for the demo backend's `/auth` endpoints.
//!
//! Passwords are stored as argon2 PHC strings and never leave this module.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use libris_core::Role;

/// Accounts created on an empty database so the demo can be logged into.
pub const DEFAULT_USERS: [(&str, &str, Role); 2] = [
    ("admin", "admin", Role::Admin),
    ("librarian", "librarian", Role::Librarian),
];

/// A stored staff account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks up an account by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<StaffUser>> {
        let user = sqlx::query_as::<_, StaffUser>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates an account with a freshly hashed password.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Username taken
    pub async fn create(&self, username: &str, password: &str, role: Role) -> DbResult<StaffUser> {
        let username = username.trim();
        debug!(username = %username, role = %role, "Creating user");

        let hash = hash_password(password)?;

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(username)
        .bind(&hash)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        let id = result.last_insert_rowid();
        self.find_by_username(username)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Checks credentials.
    ///
    /// ## Returns
    /// * `Ok(Some(user))` - Username exists and password matches
    /// * `Ok(None)` - Unknown username or wrong password
    pub async fn verify(&self, username: &str, password: &str) -> DbResult<Option<StaffUser>> {
        let Some(user) = self.find_by_username(username).await? else {
            debug!(username = %username, "Login for unknown user");
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(username = %username, "Password mismatch");
            Ok(None)
        }
    }

    /// Creates [`DEFAULT_USERS`] that don't exist yet.
    pub async fn ensure_default_users(&self) -> DbResult<()> {
        for (username, password, role) in DEFAULT_USERS {
            if self.find_by_username(username).await?.is_none() {
                self.create(username, password, role).await?;
                info!(username = %username, "Created default user");
            }
        }
        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Verify a password against its stored hash.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
