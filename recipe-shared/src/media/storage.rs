//! Local filesystem storage for uploaded media
//!
//! Files live under a root directory and are addressed by a relative path
//! such as `uploads/recipe/<uuid>.jpg`. The same relative path is stored in
//! the database and appended to `base_url` to form the public URL.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::MediaError;

/// Media root and the URL prefix it is served under
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    /// Creates a storage rooted at `root`, served at `base_url`
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Directory files are written under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative media path to a filesystem path
    ///
    /// # Errors
    ///
    /// `MediaError::InvalidPath` if `relative` is absolute or contains `..`.
    pub fn path(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if !safe {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }

        Ok(self.root.join(rel))
    }

    /// Public URL of a stored file
    pub fn url(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }

    /// Writes `bytes` to `relative`, creating parent directories
    pub async fn save(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, MediaError> {
        let path = self.path(relative)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Stored media file");
        Ok(path)
    }

    /// Removes a stored file; a file that is already gone is not an error
    pub async fn delete(&self, relative: &str) -> Result<(), MediaError> {
        let path = self.path(relative)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove media file");
                Err(e.into())
            }
        }
    }
}
