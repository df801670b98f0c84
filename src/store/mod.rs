//! Record store - the remote table of travel packages.
//!
//! Views and the admin form never talk to the database directly. They receive a
//! [`RecordStore`] at construction, so tests can hand them a wrapped or failing store
//! while production uses [`DatabaseStore`]. Every call goes to the store: there is no
//! caching and no deduplication, and an empty list is a success, not an error.

mod database;

pub use database::DatabaseStore;

use crate::{
    entities::{PackageType, TravelPackageModel},
    errors::Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row filter for [`RecordStore::list`]; rows always come back newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageFilter {
    /// Only rows of this type, or every row when `None`
    pub package_type: Option<PackageType>,
}

impl PackageFilter {
    /// Every row.
    #[must_use]
    pub const fn all() -> Self {
        Self { package_type: None }
    }

    /// Only rows of the given type.
    #[must_use]
    pub const fn of_type(package_type: PackageType) -> Self {
        Self {
            package_type: Some(package_type),
        }
    }
}

/// Insert payload: everything except the store-assigned id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageData {
    /// Display name
    pub name: String,
    /// Destination
    pub destination: String,
    /// Description
    pub description: String,
    /// Days, at least 1
    pub duration_days: i32,
    /// Nights, at least 0
    pub duration_nights: i32,
    /// Included services, at least one
    pub services: Vec<String>,
    /// Transportation
    pub transportation: String,
    /// Excursion or travel package
    #[serde(rename = "type")]
    pub package_type: PackageType,
    /// Image URL, `null` when there is none
    pub image_url: Option<String>,
    /// Optional price
    pub price: Option<f64>,
}

/// Partial update payload; `None` leaves a column untouched.
///
/// `image_url` and `price` are doubly optional so an update can clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageChanges {
    /// New name
    pub name: Option<String>,
    /// New destination
    pub destination: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New day count
    pub duration_days: Option<i32>,
    /// New night count
    pub duration_nights: Option<i32>,
    /// New services list
    pub services: Option<Vec<String>>,
    /// New transportation
    pub transportation: Option<String>,
    /// New type
    pub package_type: Option<PackageType>,
    /// New image URL (`Some(None)` clears it)
    pub image_url: Option<Option<String>>,
    /// New price (`Some(None)` clears it)
    pub price: Option<Option<f64>>,
}

impl From<PackageData> for PackageChanges {
    fn from(data: PackageData) -> Self {
        Self {
            name: Some(data.name),
            destination: Some(data.destination),
            description: Some(data.description),
            duration_days: Some(data.duration_days),
            duration_nights: Some(data.duration_nights),
            services: Some(data.services),
            transportation: Some(data.transportation),
            package_type: Some(data.package_type),
            image_url: Some(data.image_url),
            price: Some(data.price),
        }
    }
}

/// Capability to query and mutate the travel package table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Lists rows matching `filter`, ordered by `created_at` descending.
    async fn list(&self, filter: PackageFilter) -> Result<Vec<TravelPackageModel>>;

    /// Fetches one row, `None` when it does not exist.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<TravelPackageModel>>;

    /// Inserts a row; the store assigns `id`, `created_at` and `updated_at`.
    async fn create(&self, data: PackageData) -> Result<TravelPackageModel>;

    /// Applies `changes` to an existing row and refreshes `updated_at`.
    ///
    /// # Errors
    /// Returns `Error::PackageNotFound` when no row has this id.
    async fn update(&self, id: Uuid, changes: PackageChanges) -> Result<TravelPackageModel>;

    /// Deletes a row. Deleting an id that is already gone succeeds.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
