//! Ingredient model and database operations
//!
//! Ingredients are user-owned and attached to recipes. Like tags, every
//! lookup is scoped to the owning user.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE ingredients (
//!     id BIGSERIAL PRIMARY KEY,
//!     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     name VARCHAR(255) NOT NULL
//! );
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;

/// Ingredient owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// Input for creating an ingredient
#[derive(Debug, Clone)]
pub struct CreateIngredient {
    pub user_id: i64,
    pub name: String,
}

impl Ingredient {
    /// Inserts an ingredient
    pub async fn create(pool: &PgPool, data: CreateIngredient) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            "INSERT INTO ingredients (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
        )
        .bind(data.user_id)
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's ingredients, ordered by name descending
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            "SELECT id, user_id, name FROM ingredients WHERE user_id = $1 ORDER BY name DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Finds an ingredient by ID if it belongs to the user
    pub async fn find_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>("SELECT id, user_id, name FROM ingredients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Renames an ingredient, returning `None` if the user does not own it
    pub async fn rename(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            "UPDATE ingredients SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, user_id, name",
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Deletes an ingredient the user owns; recipe associations go with it
    pub async fn delete_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ingredients attached to a recipe, ordered by name
    pub async fn list_for_recipe(pool: &PgPool, recipe_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT i.id, i.user_id, i.name
            FROM ingredients i
            JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
            WHERE ri.recipe_id = $1
            ORDER BY i.name, i.id
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
        sqlx::query_scalar("SELECT id FROM ingredients WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .fetch_all(executor)
            .await
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
