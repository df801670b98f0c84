/// Database configuration and connection management
pub mod database;

/// Runtime settings from environment variables
pub mod settings;

/// Site content loading from site.toml
pub mod site;
