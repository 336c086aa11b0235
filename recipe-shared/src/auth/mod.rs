//! Authentication utilities
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`token`]: API token generation and hashing
//! - [`middleware`]: Axum middleware resolving `Authorization` headers to a user
//!
//! # Example
//!
//! ```
//! use recipe_shared::auth::password::{hash_password, verify_password};
//! use recipe_shared::auth::token::{generate_token, verify_token};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("user_password")?;
//! assert!(verify_password("user_password", &hash)?);
//!
//! let (token, token_hash) = generate_token();
//! assert!(verify_token(&token, &token_hash));
//! # Ok(())
//! # }
//! ```

pub mod middleware;
pub mod password;
pub mod token;
