//! Object storage for package images.
//!
//! [`ImageStorage`] owns the rules around the managed bucket: which URLs belong to
//! it, how uploaded objects are named, and how stored objects are removed. The raw
//! transport is behind the [`ObjectStorage`] trait so the form and dashboard can be
//! exercised against an in-memory bucket.

pub mod image;
mod supabase;

pub use self::image::{ImageFile, optimize_image, validate_image};
pub use supabase::SupabaseStorage;

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Raw access to one storage bucket.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `file` under `path` without overwriting, returning the stored path.
    async fn put_object(&self, path: &str, file: &ImageFile) -> Result<String>;

    /// Removes the objects at `paths`.
    async fn remove_objects(&self, paths: &[String]) -> Result<()>;

    /// Public URL serving the object at `path`.
    fn public_url(&self, path: &str) -> String;
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    /// Public URL to store on the record
    pub url: String,
    /// Object path inside the bucket
    pub path: String,
}

/// Package image operations on the managed bucket.
#[derive(Clone)]
pub struct ImageStorage {
    backend: Arc<dyn ObjectStorage>,
    bucket: String,
    host_marker: String,
}

impl ImageStorage {
    /// Creates the service for `bucket`; `host_marker` is a substring present in
    /// every URL the storage host serves (e.g. `supabase.co/storage`).
    pub fn new(
        backend: Arc<dyn ObjectStorage>,
        bucket: impl Into<String>,
        host_marker: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            host_marker: host_marker.into(),
        }
    }

    /// Name of the managed bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Checks that a selected file is an image. See [`validate_image`].
    pub fn validate(&self, file: &ImageFile) -> Result<()> {
        validate_image(file)
    }

    /// Re-encodes an image on a blocking thread. See [`optimize_image`].
    ///
    /// # Errors
    /// Any failure here must abort the save that asked for it.
    pub async fn optimize(&self, file: ImageFile) -> Result<ImageFile> {
        tokio::task::spawn_blocking(move || optimize_image(&file))
            .await
            .map_err(|e| Error::ImageOptimization {
                message: e.to_string(),
            })?
    }

    /// Uploads an (already optimized) image for `owner_id`.
    ///
    /// The object is named `<owner>-<unix millis>.<ext>` so different owners never
    /// collide and repeated uploads for one owner are unlikely to.
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn upload(&self, file: &ImageFile, owner_id: &str) -> Result<UploadedImage> {
        let file_name = object_file_name(
            owner_id,
            file.extension(),
            chrono::Utc::now().timestamp_millis(),
        );

        let path = self.backend.put_object(&file_name, file).await?;
        let url = self.backend.public_url(&path);
        debug!("Uploaded {} bytes to {path}", file.len());

        Ok(UploadedImage { url, path })
    }

    /// Whether `url` points into the managed bucket.
    ///
    /// Only such URLs may ever be deleted; anything else is an external reference.
    #[must_use]
    pub fn is_managed_url(&self, url: &str) -> bool {
        !url.is_empty()
            && !self.bucket.is_empty()
            && url.contains(&self.bucket_segment())
            && url.contains(&self.host_marker)
    }

    /// Deletes the object behind a public URL; external URLs are left alone.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the URL has no object path or the removal fails.
    #[instrument(skip(self))]
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        if !self.is_managed_url(url) {
            debug!("Not a managed image, nothing to delete");
            return Ok(());
        }

        let path = self.path_from_url(url).ok_or_else(|| Error::Storage {
            message: "URL de imagen inválida".to_string(),
        })?;
        self.delete_by_path(&path).await
    }

    /// Deletes the object at `path` in the bucket.
    pub async fn delete_by_path(&self, path: &str) -> Result<()> {
        self.backend.remove_objects(&[path.to_string()]).await
    }

    /// Deletes a managed image, logging instead of returning failures.
    pub async fn delete_best_effort(&self, url: &str) {
        if let Err(e) = self.delete_by_url(url).await {
            warn!("Failed to delete image {url}: {e}");
        }
    }

    /// Public URL of the object at `path`.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.backend.public_url(path)
    }

    fn bucket_segment(&self) -> String {
        format!("/{}/", self.bucket)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        let (_, rest) = url.split_once(&self.bucket_segment())?;
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        (!path.is_empty()).then(|| path.to_string())
    }
}

/// Builds the object name for an upload.
#[must_use]
pub fn object_file_name(owner_id: &str, extension: Option<&str>, timestamp_millis: i64) -> String {
    let extension = extension.unwrap_or("webp");
    format!("{owner_id}-{timestamp_millis}.{extension}")
}
