//! Database models for the recipe service
//!
//! Each model owns its SQL. Everything except `user` is scoped by owner, so
//! the `*_for_user` methods are the only way handlers read or write rows.
//!
//! # Models
//!
//! - `user`: User accounts keyed by normalized email
//! - `token`: API tokens issued at login
//! - `tag`: User-owned recipe labels
//! - `ingredient`: User-owned ingredients
//! - `recipe`: Recipes and their tag/ingredient links
//!
//! # Example
//!
//! ```no_run
//! use recipe_shared::models::tag::{CreateTag, Tag};
//! use recipe_shared::models::user::User;
//! use recipe_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let user = User::create_user(&pool, "user@example.com", "testpass123").await?;
//! let tag = Tag::create(&pool, CreateTag { user_id: user.id, name: "Dessert".to_string() }).await?;
//! assert_eq!(Tag::list_for_user(&pool, user.id).await?, vec![tag]);
//! # Ok(())
//! # }
//! ```

pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod token;
pub mod user;
