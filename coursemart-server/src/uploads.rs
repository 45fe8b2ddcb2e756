//! On-disk storage for event images.
//!
//! Files are written under the configured upload directory with a generated
//! name and referenced from documents by their public path,
//! `uploads/<file>`, which the router serves statically.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// URL prefix stored in documents and served by the router.
pub const PUBLIC_PREFIX: &str = "uploads";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Writes and removes event images inside one directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Store images under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write an uploaded image and return its public path.
    ///
    /// Only the extension of the client's file name is kept; the stored name
    /// is freshly generated.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|extension| ALLOWED_EXTENSIONS.contains(&extension.as_str()))
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "image must be one of {}",
                    ALLOWED_EXTENSIONS.join(", ")
                ))
            })?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("image file is empty".to_string()));
        }

        let stored_name = format!("{}.{extension}", Uuid::now_v7());
        tokio::fs::write(self.dir.join(&stored_name), bytes)
            .await
            .map_err(ApiError::Upload)?;

        info!(file = %stored_name, size = bytes.len(), "[uploads.save] stored image");
        Ok(format!("{PUBLIC_PREFIX}/{stored_name}"))
    }

    /// Remove a previously saved image. Failures are logged, never returned.
    pub async fn remove(&self, public_path: &str) {
        let Some(file_name) = stored_file_name(public_path) else {
            debug!(path = public_path, "[uploads.remove] not a managed upload, skipping");
            return;
        };

        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => info!(file = file_name, "[uploads.remove] removed image"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(file = file_name, "[uploads.remove] image already gone");
            }
            Err(error) => {
                warn!(file = file_name, error = %error, "[uploads.remove] could not remove image");
            }
        }
    }
}

/// The bare file name behind a public upload path, if it names one.
fn stored_file_name(public_path: &str) -> Option<&str> {
    let file_name = public_path
        .trim_start_matches('/')
        .strip_prefix(PUBLIC_PREFIX)?
        .strip_prefix('/')?;

    let plain = !file_name.is_empty()
        && !file_name.contains(['/', '\\'])
        && file_name != "."
        && file_name != "..";
    plain.then_some(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_file_under_generated_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = ImageStore::new(dir.path());

        let path = images.save("Poster.PNG", b"png-bytes").await.expect("saved");

        assert!(path.starts_with("uploads/"));
        assert!(path.ends_with(".png"));
        let file_name = stored_file_name(&path).expect("managed path");
        let written = std::fs::read(dir.path().join(file_name)).expect("file exists");
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn save_rejects_unlisted_extensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = ImageStore::new(dir.path());

        let error = images.save("script.sh", b"#!/bin/sh").await.expect_err("rejected");

        assert_eq!(
            error.to_string(),
            "image must be one of jpg, jpeg, png, gif, webp"
        );
    }

    #[tokio::test]
    async fn remove_deletes_saved_file_and_tolerates_repeats() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = ImageStore::new(dir.path());
        let path = images.save("a.jpg", b"jpeg").await.expect("saved");

        images.remove(&path).await;
        images.remove(&path).await;

        assert_eq!(std::fs::read_dir(dir.path()).expect("readable").count(), 0);
    }

    #[test]
    fn only_plain_upload_paths_are_managed() {
        assert_eq!(stored_file_name("uploads/a.png"), Some("a.png"));
        assert_eq!(stored_file_name("/uploads/a.png"), Some("a.png"));
        assert_eq!(stored_file_name("uploads/../secret"), None);
        assert_eq!(stored_file_name("https://cdn.example.com/a.png"), None);
        assert_eq!(stored_file_name("uploads/"), None);
    }
}
