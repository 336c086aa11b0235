//! # Recipe Shared Library
//!
//! This crate contains the data layer and business rules used by the
//! recipe API server and its administration commands.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL (users, tokens, tags, ingredients, recipes)
//! - `auth`: Password hashing, API tokens, and the token authentication middleware
//! - `db`: Connection pooling and migrations
//! - `filters`: Query-parameter filters for recipe listing
//! - `media`: Upload path generation, image validation, and file storage

pub mod auth;
pub mod db;
pub mod filters;
pub mod media;
pub mod models;

/// Current version of the recipe shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
