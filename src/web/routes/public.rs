//! Public site routes: health, marketing content and package listings.

use crate::{
    config::site::SiteConfig,
    core::{listing::ListingView, package},
    entities::{PackageType, TravelPackageModel},
    errors::{Error, Result},
    web::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

/// Query string of the listing route.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    /// `excursion` or `paquete_viaje`
    #[serde(rename = "type")]
    pub package_type: Option<String>,
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Marketing content of the site.
pub async fn site(State(state): State<AppState>) -> Json<SiteConfig> {
    Json(state.site.as_ref().clone())
}

/// Listing view for one package type.
pub async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingView>> {
    let raw = query.package_type.ok_or_else(|| Error::BadRequest {
        message: "Falta el parámetro `type`".to_string(),
    })?;
    let package_type = raw
        .parse::<PackageType>()
        .map_err(|message| Error::BadRequest { message })?;

    let mut view = ListingView::new(package_type, state.site.contact.whatsapp.clone());
    view.load(state.store.as_ref()).await;
    Ok(Json(view))
}

/// One package by id.
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TravelPackageModel>> {
    package::get_package(state.store.as_ref(), id)
        .await
        .map(Json)
}
