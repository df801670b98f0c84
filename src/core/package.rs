//! Package business logic - Lookup and deletion shared by the public site and the admin panel.
//!
//! The lookup is a thin wrapper over the [`RecordStore`]; deletion is the one place that
//! coordinates the store with image storage.

use crate::{
    entities::TravelPackageModel,
    errors::{Error, Result},
    storage::ImageStorage,
    store::RecordStore,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Fetches one package, failing with `Error::PackageNotFound` when it does not exist.
pub async fn get_package(store: &dyn RecordStore, id: Uuid) -> Result<TravelPackageModel> {
    store
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::PackageNotFound { id: id.to_string() })
}

/// Deletes a package and then its managed image.
///
/// The row goes first; if that fails nothing else is touched. Removing the image is
/// best-effort, so an orphaned object never turns a successful delete into an error.
/// External image URLs are never deleted.
#[instrument(skip(store, images, package), fields(id = %package.id))]
pub async fn delete_package(
    store: &dyn RecordStore,
    images: &ImageStorage,
    package: &TravelPackageModel,
) -> Result<()> {
    store.delete(package.id).await?;

    if let Some(url) = package.image_url.as_deref() {
        images.delete_best_effort(url).await;
    }

    info!("Deleted travel package '{}'", package.name);
    Ok(())
}
