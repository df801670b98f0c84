//! Entity module - Contains the SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod travel_package;

pub use travel_package::{
    Column as TravelPackageColumn, Entity as TravelPackage, Model as TravelPackageModel,
    PackageType, ServiceList,
};
