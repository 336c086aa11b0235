//! User account and token endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/users` - Create a user (public)
//! - `POST /v1/users/token` - Exchange credentials for a token (public)
//! - `DELETE /v1/users/token` - Revoke the token used for this request
//! - `GET /v1/users/me` - Current user's profile
//! - `PATCH /v1/users/me` - Update the current user's profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use recipe_shared::{
    auth::middleware::AuthContext,
    models::{
        token::AuthToken,
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: String,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    #[serde(default)]
    pub name: String,
}

/// Token request
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
}

/// Public view of a user; the password hash never leaves the server
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Plaintext token; only shown here
    pub token: String,
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
/// Content-Type: application/json
///
/// { "email": "test@example.com", "password": "testpass123", "name": "Test Name" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "id": 1, "email": "test@example.com", "name": "Test Name" }`
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email, password shorter than 5 characters
/// - `409 Conflict`: Email already registered
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let data = CreateUser::new(&req.email, &req.password)?.with_name(req.name);
    let user = User::create(&state.db, data).await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange email and password for an API token
///
/// # Endpoint
///
/// ```text
/// POST /v1/users/token
/// Content-Type: application/json
///
/// { "email": "test@example.com", "password": "testpass123" }
/// ```
///
/// # Response
///
/// `200 OK` with `{ "token": "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b" }`. Send
/// it back as `Authorization: Token <token>`.
///
/// # Errors
///
/// - `400 Bad Request`: Wrong credentials or inactive account
pub async fn create_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::authenticate(&state.db, &req.email, &req.password)
        .await?
        .ok_or_else(|| {
            ApiError::field(
                "non_field_errors",
                "Unable to authenticate with provided credentials",
            )
        })?;

    let (token, plaintext) = AuthToken::issue(&state.db, user.id).await?;
    tracing::info!(user_id = user.id, token_id = token.id, "Issued token");

    Ok(Json(TokenResponse { token: plaintext }))
}

/// Revoke the token this request was authenticated with
///
/// Responds `204 No Content`. Other tokens of the same user stay valid.
pub async fn revoke_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    AuthToken::revoke(&state.db, auth.token_id, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, token_id = auth.token_id, "Revoked token");

    Ok(StatusCode::NO_CONTENT)
}

/// Current user's profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}

/// Update the current user's email, name or password
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/users/me
/// Content-Type: application/json
///
/// { "name": "Updated name", "password": "newpassword123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email or short password
/// - `409 Conflict`: New email belongs to another user
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            email: req.email,
            name: req.name,
            password: req.password,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}
