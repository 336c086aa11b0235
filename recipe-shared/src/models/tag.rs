//! Tag model and database operations
//!
//! Tags are user-owned labels attached to recipes ("Vegan", "Dessert").
//! Every query here is scoped by owner; a tag that belongs to someone else is
//! indistinguishable from one that does not exist.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tags (
//!     id BIGSERIAL PRIMARY KEY,
//!     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     name VARCHAR(255) NOT NULL
//! );
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;

/// Tag owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// Input for creating a tag
#[derive(Debug, Clone)]
pub struct CreateTag {
    pub user_id: i64,
    pub name: String,
}

impl Tag {
    /// Inserts a tag
    pub async fn create(pool: &PgPool, data: CreateTag) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
        )
        .bind(data.user_id)
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's tags, ordered by name descending
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, user_id, name FROM tags WHERE user_id = $1 ORDER BY name DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a tag by ID if it belongs to the user
    pub async fn find_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, user_id, name FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Renames a tag, returning `None` if the user does not own it
    pub async fn rename(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "UPDATE tags SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, user_id, name",
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a tag the user owns; recipe associations go with it
    pub async fn delete_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Tags attached to a recipe, ordered by name
    pub async fn list_for_recipe(pool: &PgPool, recipe_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.user_id, t.name
            FROM tags t
            JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = $1
            ORDER BY t.name, t.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await
    }

    /// Returns the subset of `ids` owned by the user
    pub async fn owned_ids<'e, E>(executor: E, user_id: i64, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT id FROM tags WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .fetch_all(executor)
            .await
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
