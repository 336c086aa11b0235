//! User model and database operations
//!
//! Users are identified by email. The domain part of the address is
//! lower-cased on the way in, so `test@TEST.COM` and `test@test.com` are the
//! same account. Passwords are stored as Argon2id hashes.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id BIGSERIAL PRIMARY KEY,
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     name VARCHAR(255) NOT NULL DEFAULT '',
//!     password_hash VARCHAR(255) NOT NULL,
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
//!     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Deleting a user cascades to their tokens, tags, ingredients and recipes.
//!
//! # Example
//!
//! ```no_run
//! use recipe_shared::models::user::User;
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), recipe_shared::models::user::UserError> {
//! let user = User::create_user(&pool, "cook@EXAMPLE.com", "Testpass123").await?;
//! assert_eq!(user.email, "cook@example.com");
//! assert!(user.check_password("Testpass123"));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use crate::auth::password::{hash_password, verify_password, PasswordError};

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, is_staff, is_superuser, created_at, updated_at";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Primary key
    pub id: i64,

    /// Normalized email address, unique across users
    pub email: String,

    /// Display name (may be empty)
    pub name: String,

    /// Argon2id hash in PHC format
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Inactive users cannot authenticate
    pub is_active: bool,

    /// Staff users may use administrative tooling
    pub is_staff: bool,

    /// Superusers have every permission
    pub is_superuser: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors raised by the user factory and account operations
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email was missing or blank
    #[error("Users must have an email address")]
    EmailRequired,

    /// Hashing or verifying the password failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Validated input for inserting a user
///
/// Built through [`CreateUser::new`] or [`CreateUser::superuser`], which
/// normalize the email and hash the password.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Fields to change on an existing user; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    /// Plaintext; hashed before it reaches the database
    pub password: Option<String>,
}

/// Lower-cases the domain part of an email address
///
/// The local part is left alone since some mail servers treat it as
/// case-sensitive.
///
/// ```
/// use recipe_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("test@TEST.COM"), "test@test.com");
/// assert_eq!(normalize_email("Mixed.Case@Example.Org"), "Mixed.Case@example.org");
/// ```
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

impl CreateUser {
    /// Builds a regular user
    ///
    /// # Errors
    ///
    /// `UserError::EmailRequired` if `email` is empty or whitespace.
    pub fn new(email: &str, password: &str) -> Result<Self, UserError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(UserError::EmailRequired);
        }

        Ok(Self {
            email,
            name: String::new(),
            password_hash: hash_password(password)?,
            is_staff: false,
            is_superuser: false,
        })
    }

    /// Builds a user with `is_staff` and `is_superuser` set
    pub fn superuser(email: &str, password: &str) -> Result<Self, UserError> {
        Ok(Self {
            is_staff: true,
            is_superuser: true,
            ..Self::new(email, password)?
        })
    }

    /// Sets the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl User {
    /// Verifies a plaintext password against the stored hash
    ///
    /// An unparseable stored hash counts as a mismatch.
    pub fn check_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).unwrap_or(false)
    }

    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name, password_hash, is_staff, is_superuser) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.name)
            .bind(data.password_hash)
            .bind(data.is_staff)
            .bind(data.is_superuser)
            .fetch_one(pool)
            .await
    }

    /// Creates a regular user from an email and plaintext password
    pub async fn create_user(pool: &PgPool, email: &str, password: &str) -> Result<Self, UserError> {
        let user = Self::create(pool, CreateUser::new(email, password)?).await?;
        tracing::info!(user_id = user.id, "Created user");
        Ok(user)
    }

    /// Creates a staff superuser
    pub async fn create_superuser(pool: &PgPool, email: &str, password: &str) -> Result<Self, UserError> {
        let user = Self::create(pool, CreateUser::superuser(email, password)?).await?;
        tracing::info!(user_id = user.id, "Created superuser");
        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, normalizing the lookup key first
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Returns the user if the credentials match an active account
    pub async fn authenticate(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Option<Self>, UserError> {
        let Some(user) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };

        if !user.is_active || !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Updates the given fields, returning `None` if the user is gone
    ///
    /// Email is normalized and the password hashed before writing.
    pub async fn update(pool: &PgPool, id: i64, data: UpdateUser) -> Result<Option<Self>, UserError> {
        let email = match data.email {
            Some(email) => {
                let email = normalize_email(&email);
                if email.is_empty() {
                    return Err(UserError::EmailRequired);
                }
                Some(email)
            }
            None => None,
        };
        let password_hash = data.password.as_deref().map(hash_password).transpose()?;

        // Placeholders are numbered in the order the binds below are applied
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);
        if let Some(email) = email {
            q = q.bind(email);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(password_hash) = password_hash {
            q = q.bind(password_hash);
        }

        Ok(q.fetch_optional(pool).await?)
    }

    /// Deletes a user and, by cascade, everything they own
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}
