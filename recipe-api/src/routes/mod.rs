//! API route handlers
//!
//! This module contains all route handlers organized by resource:
//!
//! - `health`: Health check endpoint
//! - `users`: Account creation, login tokens and the caller's profile
//! - `tags`: Tag CRUD
//! - `ingredients`: Ingredient CRUD
//! - `recipes`: Recipe CRUD, filtering and image upload

pub mod health;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use crate::error::{ApiError, ApiResult};
use serde::Deserialize;
use validator::Validate;

/// Body for creating or replacing a tag or ingredient
#[derive(Debug, Deserialize, Validate)]
pub struct NamePayload {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

/// Body for partially updating a tag or ingredient
#[derive(Debug, Deserialize, Validate)]
pub struct PartialNamePayload {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
}

/// Trims a required text field and rejects it if nothing is left
pub(crate) fn clean_name(field: &str, raw: &str) -> ApiResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::field(field, "This field may not be blank."));
    }
    Ok(name.to_string())
}
