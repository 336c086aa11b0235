//! Recipe endpoints
//!
//! All endpoints require token authentication and are scoped to the caller's
//! own recipes. List, create and update responses carry tag and ingredient
//! IDs; the single-recipe read nests the full objects and adds the image URL.
//!
//! # Endpoints
//!
//! - `GET /v1/recipes?tags=1,2&ingredients=3` - List recipes, newest first
//! - `POST /v1/recipes` - Create a recipe
//! - `GET /v1/recipes/:id` - Recipe detail
//! - `PUT /v1/recipes/:id` - Replace a recipe
//! - `PATCH /v1/recipes/:id` - Update a recipe
//! - `DELETE /v1/recipes/:id` - Delete a recipe and its image
//! - `POST /v1/recipes/:id/upload-image` - Upload the recipe image (multipart)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    routes::{clean_name, ingredients::IngredientResponse, tags::TagResponse},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bytes::Bytes;
use recipe_shared::{
    auth::middleware::AuthContext,
    filters::{RecipeFilter, RecipeFilterParams},
    media::{path::recipe_image_file_path, validate::validate_image},
    models::{
        ingredient::Ingredient,
        recipe::{CreateRecipe, Recipe, RecipeLinks, UpdateRecipe},
        tag::Tag,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Prices are stored as NUMERIC(5, 2)
const PRICE_DECIMAL_PLACES: u32 = 2;
const PRICE_MAX_DIGITS: u32 = 5;

/// Body for creating or replacing a recipe
///
/// Omitted `tags`/`ingredients` mean "none", so a PUT without them clears
/// the recipe's links.
#[derive(Debug, Deserialize, Validate)]
pub struct RecipePayload {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub title: String,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: i32,

    pub price: Decimal,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub tags: Vec<i64>,

    #[serde(default)]
    pub ingredients: Vec<i64>,
}

/// Body for partially updating a recipe
///
/// Absent fields are left alone; a present `tags`/`ingredients` list
/// replaces the current links.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PartialRecipePayload {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub title: Option<String>,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: Option<i32>,

    pub price: Option<Decimal>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub link: Option<String>,

    pub tags: Option<Vec<i64>>,

    pub ingredients: Option<Vec<i64>>,
}

/// Recipe with linked tag and ingredient IDs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl RecipeResponse {
    fn new(recipe: Recipe, links: RecipeLinks) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: links.tags,
            ingredients: links.ingredients,
        }
    }
}

/// Recipe with nested tags and ingredients plus the image URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    pub image: Option<String>,
}

/// Result of an image upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: String,
}

/// Rejects prices that do not fit NUMERIC(5, 2)
fn check_price(price: Decimal) -> ApiResult<Decimal> {
    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(ApiError::field(
            "price",
            format!(
                "Ensure that there are no more than {} decimal places.",
                PRICE_DECIMAL_PLACES
            ),
        ));
    }

    let limit = Decimal::from(10i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if price.abs() >= limit {
        return Err(ApiError::field(
            "price",
            format!(
                "Ensure that there are no more than {} digits in total.",
                PRICE_MAX_DIGITS
            ),
        ));
    }

    Ok(price)
}

/// Builds the ID-list representation for a freshly written recipe
async fn summarize(state: &AppState, recipe: Recipe) -> ApiResult<RecipeResponse> {
    let mut links = Recipe::links_for(&state.db, &[recipe.id]).await?;
    let recipe_links = links.remove(&recipe.id).unwrap_or_default();
    Ok(RecipeResponse::new(recipe, recipe_links))
}

/// List the caller's recipes
///
/// # Endpoint
///
/// ```text
/// GET /v1/recipes?tags=1,2&ingredients=3
/// ```
///
/// `tags` and `ingredients` are optional comma-separated ID lists. A recipe
/// matches a list if it carries any of its IDs; when both are given it must
/// match both.
///
/// # Errors
///
/// - `400 Bad Request`: A list entry is not an integer
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<RecipeFilterParams>,
) -> ApiResult<Json<Vec<RecipeResponse>>> {
    let filter = RecipeFilter::try_from(params)?;

    let recipes = Recipe::list_for_user(&state.db, auth.user_id, &filter).await?;
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let mut links = Recipe::links_for(&state.db, &ids).await?;

    let body = recipes
        .into_iter()
        .map(|recipe| {
            let recipe_links = links.remove(&recipe.id).unwrap_or_default();
            RecipeResponse::new(recipe, recipe_links)
        })
        .collect();

    Ok(Json(body))
}

/// Create a recipe
///
/// # Endpoint
///
/// ```text
/// POST /v1/recipes
/// Content-Type: application/json
///
/// {
///   "title": "Sample recipe",
///   "time_minutes": 22,
///   "price": "5.25",
///   "link": "https://example.com/recipe.pdf",
///   "tags": [1, 2],
///   "ingredients": [3]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, blank title, bad price, or a tag or
///   ingredient ID the caller does not own
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<RecipePayload>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let data = CreateRecipe {
        user_id: auth.user_id,
        title: clean_name("title", &req.title)?,
        time_minutes: req.time_minutes,
        price: check_price(req.price)?,
        link: req.link,
        tag_ids: req.tags,
        ingredient_ids: req.ingredients,
    };

    let mut tx = state.db.begin().await?;
    let recipe = Recipe::create(&mut tx, data).await?;
    tx.commit().await?;

    tracing::info!(user_id = auth.user_id, recipe_id = recipe.id, "Created recipe");
    Ok((StatusCode::CREATED, Json(summarize(&state, recipe).await?)))
}

/// Recipe detail with nested tags and ingredients
pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let recipe = Recipe::find_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let tags = Tag::list_for_recipe(&state.db, recipe.id).await?;
    let ingredients = Ingredient::list_for_recipe(&state.db, recipe.id).await?;

    Ok(Json(RecipeDetailResponse {
        id: recipe.id,
        title: recipe.title,
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link,
        tags: tags.into_iter().map(TagResponse::from).collect(),
        ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        image: recipe.image.as_deref().map(|path| state.media.url(path)),
    }))
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: i64,
    update: UpdateRecipe,
) -> ApiResult<RecipeResponse> {
    let mut tx = state.db.begin().await?;
    let recipe = Recipe::update(&mut tx, id, auth.user_id, update)
        .await?
        .ok_or_else(ApiError::not_found)?;
    tx.commit().await?;

    tracing::debug!(user_id = auth.user_id, recipe_id = recipe.id, "Updated recipe");
    summarize(state, recipe).await
}

/// Replace a recipe
///
/// `title`, `time_minutes` and `price` are required. Omitted `tags` or
/// `ingredients` clear those links.
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RecipePayload>,
) -> ApiResult<Json<RecipeResponse>> {
    let update = UpdateRecipe {
        title: Some(clean_name("title", &req.title)?),
        time_minutes: Some(req.time_minutes),
        price: Some(check_price(req.price)?),
        link: Some(req.link),
        tag_ids: Some(req.tags),
        ingredient_ids: Some(req.ingredients),
    };

    Ok(Json(apply_update(&state, &auth, id, update).await?))
}

/// Update some fields of a recipe
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/recipes/42
/// Content-Type: application/json
///
/// { "title": "New title", "tags": [3] }
/// ```
///
/// Only the given fields change. A given `tags` list replaces the current
/// tags; it is not merged.
pub async fn partial_update_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<PartialRecipePayload>,
) -> ApiResult<Json<RecipeResponse>> {
    let update = UpdateRecipe {
        title: req
            .title
            .as_deref()
            .map(|title| clean_name("title", title))
            .transpose()?,
        time_minutes: req.time_minutes,
        price: req.price.map(check_price).transpose()?,
        link: req.link,
        tag_ids: req.tags,
        ingredient_ids: req.ingredients,
    };

    Ok(Json(apply_update(&state, &auth, id, update).await?))
}

/// Delete a recipe and its stored image
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let recipe = Recipe::delete_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    if let Some(image) = recipe.image.as_deref() {
        if let Err(e) = state.media.delete(image).await {
            tracing::warn!(recipe_id = recipe.id, error = %e, "Could not remove recipe image");
        }
    }

    tracing::info!(user_id = auth.user_id, recipe_id = recipe.id, "Deleted recipe");
    Ok(StatusCode::NO_CONTENT)
}

/// Upload an image for a recipe
///
/// # Endpoint
///
/// ```text
/// POST /v1/recipes/42/upload-image
/// Content-Type: multipart/form-data; boundary=...
///
/// image=<file>
/// ```
///
/// # Response
///
/// ```json
/// { "id": 42, "image": "/media/uploads/recipe/0b5f2c1e-....jpg" }
/// ```
///
/// The stored name is a fresh UUID; only the extension of the uploaded
/// filename is kept. A previous image is removed once the new one is saved.
///
/// # Errors
///
/// - `400 Bad Request`: Not multipart, no `image` field, or not a decodable image
/// - `404 Not Found`: Recipe missing or owned by someone else
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<RecipeImageResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let recipe = Recipe::find_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            upload = Some((filename, field.bytes().await?));
            break;
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::field(IMAGE_FIELD, "No file was submitted."))?;

    validate_image(&data)?;

    let relative = recipe_image_file_path(&filename);
    state.media.save(&relative, &data).await?;

    let updated = match Recipe::set_image(&state.db, recipe.id, auth.user_id, &relative).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            // Deleted between the lookup and the update
            state.media.delete(&relative).await.ok();
            return Err(ApiError::not_found());
        }
        Err(e) => {
            state.media.delete(&relative).await.ok();
            return Err(e.into());
        }
    };

    // Exactly the path this update overwrote, even with overlapping uploads
    if let Some(previous) = updated.previous.as_deref() {
        if let Err(e) = state.media.delete(previous).await {
            tracing::warn!(recipe_id = updated.id, error = %e, "Could not remove previous image");
        }
    }

    tracing::info!(
        user_id = auth.user_id,
        recipe_id = updated.id,
        size = data.len(),
        "Uploaded recipe image"
    );

    Ok(Json(RecipeImageResponse {
        id: updated.id,
        image: state.media.url(&relative),
    }))
}
