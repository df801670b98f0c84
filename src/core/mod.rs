//! Core business logic, independent of the HTTP layer.

pub mod dashboard;
pub mod form;
pub mod listing;
pub mod package;
pub mod seed;
