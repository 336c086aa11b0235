//! Ingredient endpoints
//!
//! All endpoints require token authentication and only ever touch the
//! caller's own ingredients. Another user's ingredient answers 404.
//!
//! # Endpoints
//!
//! - `GET /v1/ingredients` - List ingredients, by name descending
//! - `POST /v1/ingredients` - Create an ingredient
//! - `GET /v1/ingredients/:id` - Get an ingredient
//! - `PUT /v1/ingredients/:id` - Replace an ingredient
//! - `PATCH /v1/ingredients/:id` - Update an ingredient
//! - `DELETE /v1/ingredients/:id` - Delete an ingredient

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    routes::{clean_name, NamePayload, PartialNamePayload},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use recipe_shared::{
    auth::middleware::AuthContext,
    models::ingredient::{CreateIngredient, Ingredient},
};
use serde::{Deserialize, Serialize};

/// Wire representation of an ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

/// List the caller's ingredients
pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<IngredientResponse>>> {
    let ingredients = Ingredient::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(ingredients.into_iter().map(IngredientResponse::from).collect()))
}

/// Create an ingredient
///
/// # Endpoint
///
/// ```text
/// POST /v1/ingredients
/// Content-Type: application/json
///
/// { "name": "Salt" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or blank name
pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<NamePayload>,
) -> ApiResult<(StatusCode, Json<IngredientResponse>)> {
    let ingredient = Ingredient::create(
        &state.db,
        CreateIngredient {
            user_id: auth.user_id,
            name: clean_name("name", &req.name)?,
        },
    )
    .await?;

    tracing::debug!(user_id = auth.user_id, ingredient_id = ingredient.id, "Created ingredient");
    Ok((StatusCode::CREATED, Json(ingredient.into())))
}

/// Get one of the caller's ingredients
pub async fn get_ingredient(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<IngredientResponse>> {
    let ingredient = Ingredient::find_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(ingredient.into()))
}

/// Replace an ingredient; `name` is required
pub async fn update_ingredient(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<NamePayload>,
) -> ApiResult<Json<IngredientResponse>> {
    let ingredient = Ingredient::rename(&state.db, id, auth.user_id, &clean_name("name", &req.name)?)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(ingredient.into()))
}

/// Update an ingredient; an absent `name` leaves it unchanged
pub async fn partial_update_ingredient(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<PartialNamePayload>,
) -> ApiResult<Json<IngredientResponse>> {
    let ingredient = match req.name {
        Some(name) => Ingredient::rename(&state.db, id, auth.user_id, &clean_name("name", &name)?).await?,
        None => Ingredient::find_for_user(&state.db, id, auth.user_id).await?,
    }
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(ingredient.into()))
}

/// Delete an ingredient; it is detached from every recipe
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Ingredient::delete_for_user(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found());
    }

    tracing::debug!(user_id = auth.user_id, ingredient_id = id, "Deleted ingredient");
    Ok(StatusCode::NO_CONTENT)
}
