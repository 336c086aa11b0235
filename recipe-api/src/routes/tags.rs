//! Tag endpoints
//!
//! All endpoints require token authentication and only ever touch the
//! caller's own tags. Another user's tag answers 404.
//!
//! # Endpoints
//!
//! - `GET /v1/tags` - List tags, by name descending
//! - `POST /v1/tags` - Create a tag
//! - `GET /v1/tags/:id` - Get a tag
//! - `PUT /v1/tags/:id` - Replace a tag
//! - `PATCH /v1/tags/:id` - Update a tag
//! - `DELETE /v1/tags/:id` - Delete a tag

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
    models::tag::{CreateTag, Tag},
};
use serde::{Deserialize, Serialize};

/// Wire representation of a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

/// List the caller's tags
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = Tag::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// Create a tag
///
/// # Endpoint
///
/// ```text
/// POST /v1/tags
/// Content-Type: application/json
///
/// { "name": "Vegan" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or blank name
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<NamePayload>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    let tag = Tag::create(
        &state.db,
        CreateTag {
            user_id: auth.user_id,
            name: clean_name("name", &req.name)?,
        },
    )
    .await?;

    tracing::debug!(user_id = auth.user_id, tag_id = tag.id, "Created tag");
    Ok((StatusCode::CREATED, Json(tag.into())))
}

/// Get one of the caller's tags
pub async fn get_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TagResponse>> {
    let tag = Tag::find_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(tag.into()))
}

/// Replace a tag; `name` is required
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<NamePayload>,
) -> ApiResult<Json<TagResponse>> {
    let tag = Tag::rename(&state.db, id, auth.user_id, &clean_name("name", &req.name)?)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(tag.into()))
}

/// Update a tag; an absent `name` leaves it unchanged
pub async fn partial_update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<PartialNamePayload>,
) -> ApiResult<Json<TagResponse>> {
    let tag = match req.name {
        Some(name) => Tag::rename(&state.db, id, auth.user_id, &clean_name("name", &name)?).await?,
        None => Tag::find_for_user(&state.db, id, auth.user_id).await?,
    }
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(tag.into()))
}

/// Delete a tag; it is detached from every recipe
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Tag::delete_for_user(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found());
    }

    tracing::debug!(user_id = auth.user_id, tag_id = id, "Deleted tag");
    Ok(StatusCode::NO_CONTENT)
}
