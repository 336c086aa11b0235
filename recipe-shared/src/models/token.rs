//! API token model and database operations
//!
//! A user may hold several tokens (one per login). Tokens are stored as
//! SHA-256 hashes; the plaintext is only returned by [`AuthToken::issue`].
//! Authentication narrows candidates by the clear prefix and then compares
//! hashes in constant time.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE auth_tokens (
//!     id BIGSERIAL PRIMARY KEY,
//!     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     key_prefix VARCHAR(8) NOT NULL,
//!     key_hash VARCHAR(64) NOT NULL UNIQUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     last_used_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::token::{generate_token, token_prefix, verify_token};
use crate::models::user::User;

/// Stored API token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    pub id: i64,

    /// Owner of the token
    pub user_id: i64,

    /// First characters of the plaintext, for display
    pub key_prefix: String,

    /// SHA-256 hex of the plaintext
    #[serde(skip_serializing)]
    pub key_hash: String,

    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Issues a new token for a user
    ///
    /// Returns the stored record and the plaintext key. The plaintext is not
    /// recoverable afterwards.
    pub async fn issue(pool: &PgPool, user_id: i64) -> Result<(Self, String), sqlx::Error> {
        let (plaintext, key_hash) = generate_token();

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, key_prefix, key_hash)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, key_prefix, key_hash, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(token_prefix(&plaintext))
        .bind(key_hash)
        .fetch_one(pool)
        .await?;

        Ok((token, plaintext))
    }

    /// Resolves a plaintext token to its token record and active owner
    ///
    /// Touches `last_used_at` on success. Returns `None` for unknown tokens
    /// and for tokens whose owner is inactive.
    pub async fn authenticate(
        pool: &PgPool,
        plaintext: &str,
    ) -> Result<Option<(Self, User)>, sqlx::Error> {
        let candidates = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT id, user_id, key_prefix, key_hash, created_at, last_used_at
            FROM auth_tokens
            WHERE key_prefix = $1
            "#,
        )
        .bind(token_prefix(plaintext))
        .fetch_all(pool)
        .await?;

        let Some(matched) = find_matching(&candidates, plaintext) else {
            return Ok(None);
        };

        // Revoked between the lookup and now
        let Some(token) = sqlx::query_as::<_, AuthToken>(
            r#"
            UPDATE auth_tokens
            SET last_used_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, key_prefix, key_hash, created_at, last_used_at
            "#,
        )
        .bind(matched.id)
        .fetch_optional(pool)
        .await?
        else {
            return Ok(None);
        };

        match User::find_by_id(pool, token.user_id).await? {
            Some(user) if user.is_active => Ok(Some((token, user))),
            _ => Ok(None),
        }
    }

    /// Deletes a token belonging to the given user
    pub async fn revoke(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Picks the candidate whose stored hash matches `plaintext`
///
/// Every candidate is compared, so timing does not depend on which one
/// matches.
fn find_matching<'a>(candidates: &'a [AuthToken], plaintext: &str) -> Option<&'a AuthToken> {
    candidates.iter().fold(None, |found, candidate| {
        if verify_token(plaintext, &candidate.key_hash) {
            Some(candidate)
        } else {
            found
        }
    })
}
