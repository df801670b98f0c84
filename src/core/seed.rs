//! Initial package seeding from the site content file.

use crate::{
    core::form::{PackageDraft, validate_draft},
    errors::Result,
    store::{PackageFilter, RecordStore},
};
use tracing::{info, instrument, warn};

/// Inserts `seeds` when the store holds no packages at all.
///
/// Seeds that fail validation are skipped with a warning. Returns how many were inserted.
#[instrument(skip_all, fields(seeds = seeds.len()))]
pub async fn seed_packages(store: &dyn RecordStore, seeds: &[PackageDraft]) -> Result<usize> {
    if seeds.is_empty() {
        return Ok(0);
    }

    if !store.list(PackageFilter::all()).await?.is_empty() {
        info!("Store already has packages, skipping seed");
        return Ok(0);
    }

    let mut inserted = 0;
    for seed in seeds {
        match validate_draft(seed) {
            Ok(data) => {
                store.create(data).await?;
                inserted += 1;
            }
            Err(errors) => warn!("Skipping seed package '{}': {errors}", seed.name),
        }
    }

    info!("Seeded {inserted} travel packages");
    Ok(inserted)
}
