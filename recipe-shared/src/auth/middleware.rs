//! Token authentication middleware for Axum
//!
//! Reads the `Authorization` header, resolves the token against the
//! `auth_tokens` table and adds an [`AuthContext`] to the request extensions.
//! Both `Token <key>` and `Bearer <key>` schemes are accepted.
//!
//! Any failure (missing header, unknown scheme, malformed or unknown token,
//! inactive owner) is a 401. Handlers behind this layer can rely on the
//! extension being present.
//!
//! # Example
//!
//! ```no_run
//! use axum::{middleware, routing::get, Extension, Router};
//! use recipe_shared::auth::middleware::{token_auth_middleware, AuthContext};
//! use sqlx::PgPool;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("Hello, {}!", auth.email)
//! }
//!
//! fn router(pool: PgPool) -> Router {
//!     Router::new()
//!         .route("/protected", get(handler))
//!         .layer(middleware::from_fn_with_state(pool, token_auth_middleware))
//! }
//! ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use super::token::validate_token_format;
use crate::models::{token::AuthToken, user::User};

/// Authentication schemes accepted in the `Authorization` header
const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Authenticated caller, added to request extensions
///
/// ```
/// use axum::Extension;
/// use recipe_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User {} via token {}", auth.user_id, auth.token_id)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// User's normalized email
    pub email: String,

    /// Staff flag of the user
    pub is_staff: bool,

    /// Token the request was authenticated with
    pub token_id: i64,
}

impl AuthContext {
    /// Builds the context from a resolved token and its owner
    pub fn new(token: &AuthToken, user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            token_id: token.id,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    /// Header present but not `Token <key>` / `Bearer <key>`
    #[error("Invalid token header. {0}")]
    InvalidFormat(String),

    /// Token unknown, revoked, or its owner is inactive
    #[error("Invalid token.")]
    InvalidToken,

    /// Database error during lookup
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Token lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            _ => (StatusCode::UNAUTHORIZED, "unauthorized"),
        };

        let message = match &self {
            AuthError::Database(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": code, "message": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Token"));
        }
        response
    }
}

/// Extracts the token from an `Authorization` header value
///
/// ```
/// use recipe_shared::auth::middleware::extract_token;
///
/// assert_eq!(extract_token("Token abc").unwrap(), "abc");
/// assert_eq!(extract_token("bearer abc").unwrap(), "abc");
/// assert!(extract_token("Basic abc").is_err());
/// ```
pub fn extract_token(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();

    let scheme = parts
        .next()
        .ok_or_else(|| AuthError::InvalidFormat("No credentials provided.".to_string()))?;

    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Err(AuthError::InvalidFormat(format!(
            "Unsupported scheme '{}'.",
            scheme
        )));
    }

    match (parts.next(), parts.next()) {
        (Some(token), None) => Ok(token),
        (None, _) => Err(AuthError::InvalidFormat(
            "No credentials provided.".to_string(),
        )),
        (Some(_), Some(_)) => Err(AuthError::InvalidFormat(
            "Token string should not contain spaces.".to_string(),
        )),
    }
}

/// Token authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - Authorization header is missing or not valid UTF-8
/// - The scheme is neither `Token` nor `Bearer`
/// - The token is malformed, unknown or revoked
/// - The token's owner is inactive
pub async fn token_auth_middleware(
    State(pool): State<PgPool>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Header contains invalid characters.".to_string()))?;

    let token = extract_token(header_value)?;

    if !validate_token_format(token) {
        return Err(AuthError::InvalidToken);
    }

    let (auth_token, user) = AuthToken::authenticate(&pool, token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    let context = AuthContext::new(&auth_token, &user);
    tracing::debug!(user_id = context.user_id, token_id = context.token_id, "Authenticated request");
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
