//! Runtime settings loaded from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so everything here can come from
//! either the real environment or the dotenv file. Only the backend platform URL
//! and its public key are mandatory; everything else has a local default.

use crate::errors::{Error, Result};
use tracing::info;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BUCKET: &str = "package-images";
const DEFAULT_STORAGE_HOST_MARKER: &str = "supabase.co/storage";
const DEFAULT_SITE_CONFIG: &str = "site.toml";

/// Connection details for the hosted backend platform (auth + object storage).
#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    /// Project base URL, without trailing slash
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Privileged key used for storage writes, if configured
    pub service_key: Option<String>,
    /// Bucket holding package images
    pub bucket: String,
    /// Substring present in every public URL served by the storage host
    pub storage_host_marker: String,
}

impl SupabaseSettings {
    /// Key used for object storage requests: the service key when present, else the anon key.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }
}

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Port the HTTP server binds to
    pub port: u16,
    /// Public origin of the site, used for the default post-auth redirect
    pub site_url: String,
    /// Optional override for the post-auth redirect
    pub auth_redirect_url: Option<String>,
    /// Path of the TOML site content file
    pub site_config_path: String,
    /// Backend platform settings
    pub supabase: SupabaseSettings,
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Config {
                message: format!("{key} must be set"),
            })
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| Error::Config {
                message: format!("Invalid PORT value `{raw}`: {e}"),
            })?,
            None => {
                info!("PORT not set, using default: {DEFAULT_PORT}");
                DEFAULT_PORT
            }
        };

        let site_url = get("SITE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let supabase = SupabaseSettings {
            url: require("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            anon_key: require("SUPABASE_ANON_KEY")?,
            service_key: get("SUPABASE_SERVICE_KEY"),
            bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            storage_host_marker: get("STORAGE_HOST_MARKER")
                .unwrap_or_else(|| DEFAULT_STORAGE_HOST_MARKER.to_string()),
        };

        Ok(Self {
            port,
            site_url,
            auth_redirect_url: get("AUTH_REDIRECT_URL"),
            site_config_path: get("SITE_CONFIG").unwrap_or_else(|| DEFAULT_SITE_CONFIG.to_string()),
            supabase,
        })
    }

    /// Where users land after signing in or confirming a sign-up.
    ///
    /// Uses `AUTH_REDIRECT_URL` when set, otherwise the admin page on the site's own origin.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        self.auth_redirect_url
            .clone()
            .unwrap_or_else(|| format!("{}/admin", self.site_url))
    }
}
