//! Admin dashboard - the signed-in user's view of every package.
//!
//! The package list is fetched once and then patched locally: a confirmed save or
//! delete updates the in-memory list through [`apply_saved`] / [`apply_deleted`]
//! instead of re-fetching. The patch functions are kept pure so the list
//! transitions can be checked without any store.

use crate::{
    auth::{AuthService, User},
    core::{
        form::{PackageForm, SavedPackage},
        package::delete_package,
    },
    entities::{PackageType, TravelPackageModel},
    errors::{Error, Result},
    storage::ImageStorage,
    store::{PackageFilter, RecordStore},
};
use serde::Serialize;
use tracing::{error, instrument};
use uuid::Uuid;

const DELETE_FAILED_MESSAGE: &str = "Error al eliminar el paquete";

/// Summary counters shown above the package grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Every package
    pub total: usize,
    /// Packages of type excursion
    pub excursions: usize,
    /// Packages of type travel package
    pub travel_packages: usize,
    /// Mean `duration_days`, rounded; 0 for an empty list
    pub average_duration_days: i64,
}

impl DashboardStats {
    /// Derives the counters from an in-memory list.
    #[must_use]
    pub fn from_packages(packages: &[TravelPackageModel]) -> Self {
        let count_of = |package_type: PackageType| {
            packages
                .iter()
                .filter(|p| p.package_type == package_type)
                .count()
        };

        Self {
            total: packages.len(),
            excursions: count_of(PackageType::Excursion),
            travel_packages: count_of(PackageType::TravelPackage),
            average_duration_days: average_days(packages),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn average_days(packages: &[TravelPackageModel]) -> i64 {
    if packages.is_empty() {
        return 0;
    }
    let total: i64 = packages.iter().map(|p| i64::from(p.duration_days)).sum();
    (total as f64 / packages.len() as f64).round() as i64
}

/// Applies a confirmed save: creates go to the front, edits replace in place.
pub fn apply_saved(packages: &mut Vec<TravelPackageModel>, saved: &SavedPackage) {
    match saved {
        SavedPackage::Created(record) => packages.insert(0, record.clone()),
        SavedPackage::Updated(record) => {
            if let Some(slot) = packages.iter_mut().find(|p| p.id == record.id) {
                *slot = record.clone();
            } else {
                packages.insert(0, record.clone());
            }
        }
    }
}

/// Applies a confirmed delete.
pub fn apply_deleted(packages: &mut Vec<TravelPackageModel>, id: Uuid) {
    packages.retain(|p| p.id != id);
}

/// Loaded dashboard state.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    user: User,
    packages: Vec<TravelPackageModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Dashboard {
    /// Resolves the session user and fetches every package.
    ///
    /// # Errors
    /// Returns `Error::Unauthorized` when the token has no user, or the store error.
    #[instrument(skip_all)]
    pub async fn load(
        auth: &AuthService,
        store: &dyn RecordStore,
        access_token: &str,
    ) -> Result<Self> {
        let user = auth
            .current_user(access_token)
            .await?
            .ok_or(Error::Unauthorized)?;
        Self::for_user(user, store).await
    }

    /// Fetches every package for a user whose session is already resolved.
    ///
    /// # Errors
    /// Returns the store error.
    #[instrument(skip_all, fields(user = %user.id))]
    pub async fn for_user(user: User, store: &dyn RecordStore) -> Result<Self> {
        let packages = store.list(PackageFilter::all()).await?;
        Ok(Self::new(user, packages))
    }

    /// Builds the state from an already-fetched list.
    #[must_use]
    pub const fn new(user: User, packages: Vec<TravelPackageModel>) -> Self {
        Self {
            user,
            packages,
            error: None,
        }
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Current in-memory list, newest first.
    #[must_use]
    pub fn packages(&self) -> &[TravelPackageModel] {
        &self.packages
    }

    /// Page-level error from the last failed action.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Counters for the current list.
    #[must_use]
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_packages(&self.packages)
    }

    /// Opens the form to edit package `id`, if it is listed.
    #[must_use]
    pub fn edit_form(&self, id: Uuid) -> Option<PackageForm> {
        self.packages
            .iter()
            .find(|p| p.id == id)
            .map(PackageForm::edit)
    }

    /// Submits `form` and patches the list with the saved record.
    ///
    /// # Errors
    /// Whatever the submit fails with; the list is left unchanged.
    pub async fn save(
        &mut self,
        form: &mut PackageForm,
        store: &dyn RecordStore,
        images: &ImageStorage,
    ) -> Result<TravelPackageModel> {
        let saved = form.submit(store, images).await?;
        apply_saved(&mut self.packages, &saved);
        Ok(saved.into_record())
    }

    /// Deletes package `id` once `confirm` agrees.
    ///
    /// Returns `false` when the user declined, in which case nothing is called. The
    /// row leaves the list only after the store delete succeeded.
    ///
    /// # Errors
    /// Returns `Error::PackageNotFound` if `id` is not listed, or the store error
    /// (the row then stays listed and [`Self::error`] is set).
    #[instrument(skip(self, confirm, store, images))]
    pub async fn delete<F>(
        &mut self,
        id: Uuid,
        confirm: F,
        store: &dyn RecordStore,
        images: &ImageStorage,
    ) -> Result<bool>
    where
        F: FnOnce(&TravelPackageModel) -> bool + Send,
    {
        let package = self
            .packages
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound { id: id.to_string() })?;

        if !confirm(&package) {
            return Ok(false);
        }

        match delete_package(store, images, &package).await {
            Ok(()) => {
                apply_deleted(&mut self.packages, id);
                self.error = None;
                Ok(true)
            }
            Err(e) => {
                error!("Error deleting package {id}: {e}");
                self.error = Some(DELETE_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}
