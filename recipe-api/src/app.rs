//! Application state and router builder
//!
//! This module defines the shared application state and provides
//! a function to build the Axum router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use recipe_api::{app::{build_router, AppState}, config::Config};
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let app = build_router(AppState::new(pool, config));
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, routes};
use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use recipe_shared::{auth::middleware::token_auth_middleware, media::storage::MediaStorage};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Where uploaded images are written and how they are addressed
    pub media: MediaStorage,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let media = MediaStorage::new(config.media.root.clone(), config.media.url.clone());

        Self {
            db,
            config: Arc::new(config),
            media,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                           # Health check (public)
/// ├── /media/...                        # Uploaded files (public)
/// └── /v1/
///     ├── POST   /users                 # Create user (public)
///     ├── POST   /users/token           # Log in, get a token (public)
///     ├── DELETE /users/token           # Revoke the presented token
///     ├── GET    /users/me              # Own profile
///     ├── PATCH  /users/me
///     ├── GET    /tags                  # Tags
///     ├── POST   /tags
///     ├── GET    /tags/:id
///     ├── PUT    /tags/:id
///     ├── PATCH  /tags/:id
///     ├── DELETE /tags/:id
///     ├── ...    /ingredients           # Same shape as tags
///     ├── GET    /recipes?tags=&ingredients=
///     ├── POST   /recipes
///     ├── GET    /recipes/:id           # Nested detail representation
///     ├── PUT    /recipes/:id
///     ├── PATCH  /recipes/:id
///     ├── DELETE /recipes/:id
///     └── POST   /recipes/:id/upload-image
/// ```
///
/// Everything under `/v1` except user creation and login requires a token.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Token authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let auth = axum::middleware::from_fn_with_state(state.db.clone(), token_auth_middleware);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/users", post(routes::users::create_user))
        .route(
            "/users/token",
            post(routes::users::create_token).delete(routes::users::revoke_token.layer(auth.clone())),
        );

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(routes::users::get_me).patch(routes::users::update_me),
        )
        .route(
            "/tags",
            get(routes::tags::list_tags).post(routes::tags::create_tag),
        )
        .route(
            "/tags/:id",
            get(routes::tags::get_tag)
                .put(routes::tags::update_tag)
                .patch(routes::tags::partial_update_tag)
                .delete(routes::tags::delete_tag),
        )
        .route(
            "/ingredients",
            get(routes::ingredients::list_ingredients).post(routes::ingredients::create_ingredient),
        )
        .route(
            "/ingredients/:id",
            get(routes::ingredients::get_ingredient)
                .put(routes::ingredients::update_ingredient)
                .patch(routes::ingredients::partial_update_ingredient)
                .delete(routes::ingredients::delete_ingredient),
        )
        .route(
            "/recipes",
            get(routes::recipes::list_recipes).post(routes::recipes::create_recipe),
        )
        .route(
            "/recipes/:id",
            get(routes::recipes::get_recipe)
                .put(routes::recipes::update_recipe)
                .patch(routes::recipes::partial_update_recipe)
                .delete(routes::recipes::delete_recipe),
        )
        .route(
            "/recipes/:id/upload-image",
            post(routes::recipes::upload_image)
                .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes)),
        )
        .layer(auth);

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    let mut router = Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes);

    // Only a path prefix can be served locally; a full URL points elsewhere
    let media_prefix = state.config.media.url.trim_end_matches('/');
    if media_prefix.starts_with('/') {
        router = router.nest_service(media_prefix, ServeDir::new(state.media.root()));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, MediaConfig};

    fn config(origins: &[&str]) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: origins.iter().map(|o| o.to_string()).collect(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/unused".to_string(),
                max_connections: 1,
            },
            media: MediaConfig {
                root: "./media".into(),
                url: "/media".to_string(),
                max_upload_bytes: 1024,
            },
        }
    }

    #[tokio::test]
    async fn test_app_state_builds_media_storage() {
        let pool = PgPool::connect_lazy("postgresql://localhost/unused").unwrap();
        let state = AppState::new(pool, config(&["*"]));

        assert_eq!(state.media.url("uploads/recipe/x.png"), "/media/uploads/recipe/x.png");
        assert_eq!(state.media.root(), std::path::Path::new("./media"));
    }

    #[tokio::test]
    async fn test_router_builds_with_restricted_cors() {
        let pool = PgPool::connect_lazy("postgresql://localhost/unused").unwrap();
        let _router = build_router(AppState::new(pool, config(&["https://app.example"])));
    }
}
