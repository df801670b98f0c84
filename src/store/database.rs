//! `SeaORM`-backed record store.

use super::{PackageChanges, PackageData, PackageFilter, RecordStore};
use crate::{
    entities::{ServiceList, TravelPackage, TravelPackageModel, travel_package},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// Record store talking to the `travel_packages` table through `SeaORM`.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl RecordStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn list(&self, filter: PackageFilter) -> Result<Vec<TravelPackageModel>> {
        let mut query = TravelPackage::find();
        if let Some(package_type) = filter.package_type {
            query = query.filter(travel_package::Column::PackageType.eq(package_type));
        }

        query
            .order_by_desc(travel_package::Column::CreatedAt)
            .order_by_desc(travel_package::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<TravelPackageModel>> {
        TravelPackage::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    async fn create(&self, data: PackageData) -> Result<TravelPackageModel> {
        let now = chrono::Utc::now();

        let package = travel_package::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(data.name),
            destination: Set(data.destination),
            description: Set(data.description),
            duration_days: Set(data.duration_days),
            duration_nights: Set(data.duration_nights),
            services: Set(ServiceList(data.services)),
            transportation: Set(data.transportation),
            package_type: Set(data.package_type),
            image_url: Set(data.image_url),
            price: Set(data.price),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = package.insert(&self.db).await?;
        debug!("Inserted travel package {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: Uuid, changes: PackageChanges) -> Result<TravelPackageModel> {
        let mut package: travel_package::ActiveModel = TravelPackage::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::PackageNotFound { id: id.to_string() })?
            .into();

        if let Some(name) = changes.name {
            package.name = Set(name);
        }
        if let Some(destination) = changes.destination {
            package.destination = Set(destination);
        }
        if let Some(description) = changes.description {
            package.description = Set(description);
        }
        if let Some(days) = changes.duration_days {
            package.duration_days = Set(days);
        }
        if let Some(nights) = changes.duration_nights {
            package.duration_nights = Set(nights);
        }
        if let Some(services) = changes.services {
            package.services = Set(ServiceList(services));
        }
        if let Some(transportation) = changes.transportation {
            package.transportation = Set(transportation);
        }
        if let Some(package_type) = changes.package_type {
            package.package_type = Set(package_type);
        }
        if let Some(image_url) = changes.image_url {
            package.image_url = Set(image_url);
        }
        if let Some(price) = changes.price {
            package.price = Set(price);
        }
        package.updated_at = Set(chrono::Utc::now());

        package.update(&self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = TravelPackage::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            debug!("Travel package {id} was already gone");
        }
        Ok(())
    }
}
