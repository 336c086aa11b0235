//! Uploaded media handling
//!
//! Recipe images go through three steps:
//!
//! - [`validate`]: check that the upload decodes as an image
//! - [`path`]: generate a fresh storage path that never reuses the client's filename
//! - [`storage`]: write the bytes under the media root and build the public URL
//!
//! # Example
//!
//! ```no_run
//! use recipe_shared::media::{validate::validate_image, path::recipe_image_file_path, storage::MediaStorage};
//!
//! # async fn example(upload: Vec<u8>) -> Result<(), recipe_shared::media::MediaError> {
//! let storage = MediaStorage::new("./media", "/media");
//!
//! validate_image(&upload)?;
//! let relative = recipe_image_file_path("photo.jpg");
//! storage.save(&relative, &upload).await?;
//!
//! println!("served at {}", storage.url(&relative));
//! # Ok(())
//! # }
//! ```

pub mod validate;
pub mod path;
pub mod storage;

/// Errors raised while validating or storing media
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Payload is not a decodable image
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    InvalidImage,

    /// Relative path escapes the media root
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    /// Filesystem error
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}
