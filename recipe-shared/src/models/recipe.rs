//! Recipe model and database operations
//!
//! A recipe belongs to one user and links to any number of that user's tags
//! and ingredients through the `recipe_tags` and `recipe_ingredients` join
//! tables. Writes that touch the links take a `&mut PgConnection` so the
//! caller can run them inside one transaction.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE recipes (
//!     id BIGSERIAL PRIMARY KEY,
//!     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     title VARCHAR(255) NOT NULL,
//!     time_minutes INTEGER NOT NULL,
//!     price NUMERIC(5, 2) NOT NULL,
//!     link VARCHAR(255) NOT NULL DEFAULT '',
//!     image VARCHAR(255),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use recipe_shared::models::recipe::{CreateRecipe, Recipe};
//! use rust_decimal::Decimal;
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool, user_id: i64, vegan: i64) -> Result<(), Box<dyn std::error::Error>> {
//! let mut tx = pool.begin().await?;
//! let recipe = Recipe::create(&mut tx, CreateRecipe {
//!     user_id,
//!     title: "Avocado lime cheesecake".to_string(),
//!     time_minutes: 60,
//!     price: Decimal::new(2000, 2),
//!     link: String::new(),
//!     tag_ids: vec![vegan],
//!     ingredient_ids: vec![],
//! })
//! .await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::fmt;

use crate::filters::RecipeFilter;
use crate::models::{ingredient::Ingredient, tag::Tag};

const RECIPE_COLUMNS: &str =
    "id, user_id, title, time_minutes, price, link, image, created_at, updated_at";

/// Recipe row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,

    /// Path of the uploaded image relative to the media root
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tag and ingredient IDs linked to one recipe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeLinks {
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

/// Outcome of [`Recipe::set_image`]
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ReplacedImage {
    /// Recipe that now points at the new image
    pub id: i64,

    /// Image path the update overwrote, if any
    pub previous: Option<String>,
}

/// Input for creating a recipe
#[derive(Debug, Clone)]
pub struct CreateRecipe {
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Changes to apply to a recipe
///
/// `None` leaves a field alone. For `tag_ids`/`ingredient_ids`, `Some`
/// replaces the whole link set, so `Some(vec![])` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

/// Errors raised by recipe writes
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// Tag IDs that do not exist or belong to another user
    #[error("Unknown tag ids: {0:?}")]
    UnknownTags(Vec<i64>),

    /// Ingredient IDs that do not exist or belong to another user
    #[error("Unknown ingredient ids: {0:?}")]
    UnknownIngredients(Vec<i64>),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn missing_ids(requested: &[i64], owned: &[i64]) -> Vec<i64> {
    let mut missing: Vec<i64> = Vec::new();
    for id in requested {
        if !owned.contains(id) && !missing.contains(id) {
            missing.push(*id);
        }
    }
    missing
}

async fn check_ownership(
    conn: &mut PgConnection,
    user_id: i64,
    tag_ids: Option<&[i64]>,
    ingredient_ids: Option<&[i64]>,
) -> Result<(), RecipeError> {
    if let Some(ids) = tag_ids.filter(|ids| !ids.is_empty()) {
        let owned = Tag::owned_ids(&mut *conn, user_id, ids).await?;
        let missing = missing_ids(ids, &owned);
        if !missing.is_empty() {
            return Err(RecipeError::UnknownTags(missing));
        }
    }

    if let Some(ids) = ingredient_ids.filter(|ids| !ids.is_empty()) {
        let owned = Ingredient::owned_ids(&mut *conn, user_id, ids).await?;
        let missing = missing_ids(ids, &owned);
        if !missing.is_empty() {
            return Err(RecipeError::UnknownIngredients(missing));
        }
    }

    Ok(())
}

async fn replace_tags(conn: &mut PgConnection, recipe_id: i64, tag_ids: &[i64]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !tag_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO recipe_tags (recipe_id, tag_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(recipe_id)
        .bind(tag_ids)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn replace_ingredients(
    conn: &mut PgConnection,
    recipe_id: i64,
    ingredient_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !ingredient_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(recipe_id)
        .bind(ingredient_ids)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

impl Recipe {
    /// Inserts a recipe and links its tags and ingredients
    ///
    /// # Errors
    ///
    /// `UnknownTags`/`UnknownIngredients` if any linked ID is not owned by
    /// `data.user_id`; nothing is written in that case.
    pub async fn create(conn: &mut PgConnection, data: CreateRecipe) -> Result<Self, RecipeError> {
        check_ownership(
            conn,
            data.user_id,
            Some(&data.tag_ids),
            Some(&data.ingredient_ids),
        )
        .await?;

        let query = format!(
            "INSERT INTO recipes (user_id, title, time_minutes, price, link) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            RECIPE_COLUMNS
        );

        let recipe = sqlx::query_as::<_, Recipe>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.time_minutes)
            .bind(data.price)
            .bind(data.link)
            .fetch_one(&mut *conn)
            .await?;

        replace_tags(conn, recipe.id, &data.tag_ids).await?;
        replace_ingredients(conn, recipe.id, &data.ingredient_ids).await?;

        tracing::debug!(recipe_id = recipe.id, user_id = recipe.user_id, "Created recipe");
        Ok(recipe)
    }

    /// Applies an update to a recipe the user owns
    ///
    /// Returns `None` when the recipe does not exist or is someone else's.
    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        user_id: i64,
        data: UpdateRecipe,
    ) -> Result<Option<Self>, RecipeError> {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM recipes WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        check_ownership(
            conn,
            user_id,
            data.tag_ids.as_deref(),
            data.ingredient_ids.as_deref(),
        )
        .await?;

        let mut query = String::from("UPDATE recipes SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.time_minutes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", time_minutes = ${}", bind_count));
        }
        if data.price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", price = ${}", bind_count));
        }
        if data.link.is_some() {
            bind_count += 1;
            query.push_str(&format!(", link = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {}",
            RECIPE_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Recipe>(&query).bind(id).bind(user_id);
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(time_minutes) = data.time_minutes {
            q = q.bind(time_minutes);
        }
        if let Some(price) = data.price {
            q = q.bind(price);
        }
        if let Some(link) = data.link {
            q = q.bind(link);
        }

        let Some(recipe) = q.fetch_optional(&mut *conn).await? else {
            return Ok(None);
        };

        if let Some(tag_ids) = data.tag_ids {
            replace_tags(conn, recipe.id, &tag_ids).await?;
        }
        if let Some(ingredient_ids) = data.ingredient_ids {
            replace_ingredients(conn, recipe.id, &ingredient_ids).await?;
        }

        Ok(Some(recipe))
    }

    /// Lists a user's recipes, newest first, narrowed by `filter`
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM recipes r
            WHERE r.user_id = $1
              AND ($2::BIGINT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags rt
                    WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)))
              AND ($3::BIGINT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_ingredients ri
                    WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)))
            ORDER BY r.id DESC
            "#,
            RECIPE_COLUMNS
        );

        sqlx::query_as::<_, Recipe>(&query)
            .bind(user_id)
            .bind(filter.tags.as_deref())
            .bind(filter.ingredients.as_deref())
            .fetch_all(pool)
            .await
    }

    /// Finds a recipe by ID if it belongs to the user
    pub async fn find_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM recipes WHERE id = $1 AND user_id = $2",
            RECIPE_COLUMNS
        );

        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Points the recipe at a newly stored image
    ///
    /// The previous path is read from the row locked by the same statement,
    /// so concurrent uploads each get back the path they actually replaced.
    /// Returns `None` when the recipe does not exist or is someone else's.
    pub async fn set_image(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        image: &str,
    ) -> Result<Option<ReplacedImage>, sqlx::Error> {
        sqlx::query_as::<_, ReplacedImage>(
            r#"
            UPDATE recipes r
            SET image = $3, updated_at = NOW()
            FROM (
                SELECT id, image FROM recipes
                WHERE id = $1 AND user_id = $2
                FOR UPDATE
            ) old
            WHERE r.id = old.id
            RETURNING r.id, old.image AS previous
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(image)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a recipe the user owns, returning the deleted row
    pub async fn delete_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "DELETE FROM recipes WHERE id = $1 AND user_id = $2 RETURNING {}",
            RECIPE_COLUMNS
        );

        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Loads tag and ingredient IDs for a batch of recipes
    ///
    /// Every requested recipe gets an entry, empty if it has no links.
    pub async fn links_for(pool: &PgPool, recipe_ids: &[i64]) -> Result<HashMap<i64, RecipeLinks>, sqlx::Error> {
        let mut links: HashMap<i64, RecipeLinks> = recipe_ids
            .iter()
            .map(|id| (*id, RecipeLinks::default()))
            .collect();

        if recipe_ids.is_empty() {
            return Ok(links);
        }

        let tag_rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT recipe_id, tag_id FROM recipe_tags WHERE recipe_id = ANY($1) ORDER BY tag_id",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        for (recipe_id, tag_id) in tag_rows {
            links.entry(recipe_id).or_default().tags.push(tag_id);
        }

        let ingredient_rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT recipe_id, ingredient_id FROM recipe_ingredients \
             WHERE recipe_id = ANY($1) ORDER BY ingredient_id",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        for (recipe_id, ingredient_id) in ingredient_rows {
            links.entry(recipe_id).or_default().ingredients.push(ingredient_id);
        }

        Ok(links)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
