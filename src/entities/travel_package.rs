//! Travel package entity - The single record type behind the public listings and the admin panel.
//!
//! Each row describes either a day excursion or a multi-day travel package, with its
//! duration, included services, transportation and an optional image and price.
//! `created_at` and `updated_at` are stamped by the store, never by callers.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref, str::FromStr};

/// Kind of offering a record describes.
///
/// The wire/database spelling (`excursion`, `paquete_viaje`) is shared with the
/// hosted table, so it must not change.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PackageType {
    /// A short guided outing
    #[sea_orm(string_value = "excursion")]
    #[serde(rename = "excursion")]
    Excursion,
    /// A full travel package with lodging
    #[sea_orm(string_value = "paquete_viaje")]
    #[serde(rename = "paquete_viaje")]
    TravelPackage,
}

impl PackageType {
    /// Stored spelling of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excursion => "excursion",
            Self::TravelPackage => "paquete_viaje",
        }
    }

    /// Human-readable badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excursion => "Excursión",
            Self::TravelPackage => "Paquete de Viaje",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "excursion" => Ok(Self::Excursion),
            "paquete_viaje" => Ok(Self::TravelPackage),
            other => Err(format!("unknown package type `{other}`")),
        }
    }
}

/// Ordered list of included services, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ServiceList(pub Vec<String>);

impl Deref for ServiceList {
    type Target = Vec<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for ServiceList {
    fn from(services: Vec<String>) -> Self {
        Self(services)
    }
}

/// Travel package database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "travel_packages")]
pub struct Model {
    /// Unique identifier, assigned on insert and never changed
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Display name (e.g., "Safari Nocturno")
    pub name: String,
    /// Where the trip goes (e.g., "Esteros del Iberá, Corrientes")
    pub destination: String,
    /// Marketing description
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Number of days, at least 1
    pub duration_days: i32,
    /// Number of nights, never negative
    pub duration_nights: i32,
    /// Included services, at least one
    #[sea_orm(column_type = "Json")]
    pub services: ServiceList,
    /// How travellers get around (e.g., "Lancha")
    pub transportation: String,
    /// Excursion or travel package
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub package_type: PackageType,
    /// Bucket-hosted or external image, if any
    pub image_url: Option<String>,
    /// Optional positive price
    pub price: Option<f64>,
    /// Set by the store on insert
    pub created_at: DateTimeUtc,
    /// Set by the store on every update
    pub updated_at: DateTimeUtc,
}

/// Travel packages have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
