//! Site content loading from site.toml
//!
//! The marketing sections of the public site (hero, about, lodge, gallery,
//! testimonials, contact) are plain content, so they live in a TOML file instead of
//! the database. The same file may list `[[packages]]` used to seed an empty store.

use crate::core::form::PackageDraft;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration structure representing the entire site.toml file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Brand name shown in headers and page titles
    #[serde(default)]
    pub brand: String,
    /// Hero banner
    #[serde(default)]
    pub hero: Hero,
    /// About section paragraphs
    #[serde(default)]
    pub about: Vec<String>,
    /// Lodge / stay section
    #[serde(default)]
    pub lodge: Lodge,
    /// Gallery images
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    /// Reasons to choose the operator
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Customer testimonials
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    /// Contact channels
    #[serde(default)]
    pub contact: Contact,
    /// Packages inserted when the store is empty
    #[serde(default, skip_serializing)]
    pub packages: Vec<PackageDraft>,
}

/// Hero banner content
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Hero {
    /// Main heading
    pub title: String,
    /// Supporting line
    pub subtitle: String,
    /// Background image path or URL
    #[serde(default)]
    pub image: Option<String>,
}

/// Lodge section content
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Lodge {
    /// Short description of the lodge
    #[serde(default)]
    pub description: String,
    /// Listed amenities
    #[serde(default)]
    pub amenities: Vec<Highlight>,
    /// Fixed stay plans
    #[serde(default)]
    pub stays: Vec<StayPlan>,
}

/// A fixed lodge stay offer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StayPlan {
    /// Plan name (e.g., "Escapada de Fin de Semana")
    pub name: String,
    /// Duration label (e.g., "2 días / 1 noche")
    pub duration: String,
    /// Price label as shown to visitors
    pub price: String,
    /// What the stay includes
    #[serde(default)]
    pub includes: Vec<String>,
    /// Whether the plan is highlighted
    #[serde(default)]
    pub popular: bool,
}

/// Titled blurb used for amenities and highlights
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Highlight {
    /// Short label
    pub title: String,
    /// One-sentence explanation
    pub description: String,
}

/// A gallery picture
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryImage {
    /// Image path or URL
    pub src: String,
    /// Alternative text
    pub alt: String,
}

/// A customer testimonial
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Testimonial {
    /// Who said it
    pub author: String,
    /// Where they travelled from
    #[serde(default)]
    pub origin: Option<String>,
    /// What they said
    pub quote: String,
    /// Star rating out of five
    #[serde(default = "default_rating")]
    pub rating: u8,
}

const fn default_rating() -> u8 {
    5
}

/// Contact channels
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Contact {
    /// WhatsApp number in international format, digits only
    #[serde(default)]
    pub whatsapp: String,
    /// Phone number as displayed
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact e-mail
    #[serde(default)]
    pub email: Option<String>,
    /// Postal address or area
    #[serde(default)]
    pub address: Option<String>,
    /// Instagram profile URL
    #[serde(default)]
    pub instagram: Option<String>,
    /// Facebook page URL
    #[serde(default)]
    pub facebook: Option<String>,
}

/// Loads site content from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_site_config<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading site content from {path_ref:?}");

    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read site config {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse site config {path_ref:?}: {e}"),
    })
}
