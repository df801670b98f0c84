//! Route handlers, one module per area of the site.

/// Admin panel: dashboard and package CRUD
pub mod admin;
/// Sign in, sign up, sign out and session lookup
pub mod auth;
/// Public site: content and listings
pub mod public;
