//! Storage paths for recipe images

use std::path::Path;
use uuid::Uuid;

/// Directory, relative to the media root, holding recipe images
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

const MAX_EXTENSION_LEN: usize = 10;

/// Generates a fresh path for a recipe image
///
/// Only the extension of `filename` survives, and only when it is a short
/// ASCII alphanumeric string. The stem is always a new UUIDv4, so client
/// filenames can neither collide nor traverse out of [`RECIPE_IMAGE_DIR`].
///
/// ```
/// use recipe_shared::media::path::recipe_image_file_path;
///
/// let path = recipe_image_file_path("myimage.jpg");
/// assert!(path.starts_with("uploads/recipe/"));
/// assert!(path.ends_with(".jpg"));
/// ```
pub fn recipe_image_file_path(filename: &str) -> String {
    let id = Uuid::new_v4();

    match extension(filename) {
        Some(ext) => format!("{}/{}.{}", RECIPE_IMAGE_DIR, id, ext),
        None => format!("{}/{}", RECIPE_IMAGE_DIR, id),
    }
}

fn extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}
