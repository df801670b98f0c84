//! Public listing views for excursions and travel packages.
//!
//! A view fetches its own rows once and settles into one of three states: empty
//! (zero rows is not an error), populated with cards, or failed. Cards carry
//! everything the page needs to render them, including the WhatsApp inquiry link.

use crate::{
    entities::{PackageType, TravelPackageModel},
    store::{PackageFilter, RecordStore},
};
use serde::Serialize;
use tracing::{error, instrument};
use url::Url;
use uuid::Uuid;

/// Skeleton cards shown while loading.
pub const PLACEHOLDER_CARDS: usize = 3;

/// Services shown on a card before the "+N más" overflow.
pub const VISIBLE_SERVICES: usize = 3;

const LOAD_FAILED_MESSAGE: &str = "No se pudieron cargar los paquetes. Inténtalo más tarde.";
const IMAGE_UNAVAILABLE: &str = "Imagen no disponible";

/// How a card shows its picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardImage {
    /// Load the image from this URL
    Remote {
        /// Image URL
        url: String,
        /// Alternative text
        alt: String,
    },
    /// No usable image; render the placeholder
    Placeholder {
        /// Caption shown on the placeholder
        message: String,
    },
}

impl CardImage {
    fn placeholder() -> Self {
        Self::Placeholder {
            message: IMAGE_UNAVAILABLE.to_string(),
        }
    }
}

/// Presentation of one package in the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageCard {
    /// Record id
    pub id: Uuid,
    /// Package name
    pub name: String,
    /// Destination
    pub destination: String,
    /// Description
    pub description: String,
    /// Type badge, e.g. "Excursión"
    pub badge: String,
    /// e.g. "3 días, 2 noches"
    pub duration_label: String,
    /// Transportation
    pub transportation: String,
    /// Formatted price, when the package has one
    pub price_label: Option<String>,
    /// First few services
    pub services: Vec<String>,
    /// How many services did not fit
    pub more_services: usize,
    /// Picture or placeholder
    pub image: CardImage,
    /// WhatsApp link with a prefilled inquiry
    pub inquiry_url: Option<String>,
}

impl PackageCard {
    /// Builds the card for `record`; `whatsapp` is the operator's number.
    #[must_use]
    pub fn new(record: &TravelPackageModel, whatsapp: &str) -> Self {
        let image = record
            .image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map_or_else(CardImage::placeholder, |url| CardImage::Remote {
                url: url.to_string(),
                alt: record.name.clone(),
            });

        Self {
            id: record.id,
            name: record.name.clone(),
            destination: record.destination.clone(),
            description: record.description.clone(),
            badge: record.package_type.label().to_string(),
            duration_label: duration_label(record.duration_days, record.duration_nights),
            transportation: record.transportation.clone(),
            price_label: record.price.map(price_label),
            services: record
                .services
                .iter()
                .take(VISIBLE_SERVICES)
                .cloned()
                .collect(),
            more_services: record.services.len().saturating_sub(VISIBLE_SERVICES),
            image,
            inquiry_url: inquiry_url(whatsapp, record),
        }
    }

    /// Swaps the picture for the placeholder after the image failed to load.
    pub fn use_placeholder(&mut self) {
        self.image = CardImage::placeholder();
    }
}

/// "1 día", "3 días, 2 noches"; zero nights are left out.
#[must_use]
pub fn duration_label(days: i32, nights: i32) -> String {
    let days_label = format!("{days} día{}", if days == 1 { "" } else { "s" });
    if nights > 0 {
        format!(
            "{days_label}, {nights} noche{}",
            if nights == 1 { "" } else { "s" }
        )
    } else {
        days_label
    }
}

/// Formats a price with `.` thousands separators, e.g. `$35.000` or `$1.250,50`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn price_label(price: f64) -> String {
    let cents = (price * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if fraction == 0 {
        format!("${grouped}")
    } else {
        format!("${grouped},{fraction:02}")
    }
}

/// WhatsApp link asking about `record`, or `None` without a usable number.
#[must_use]
pub fn inquiry_url(whatsapp: &str, record: &TravelPackageModel) -> Option<String> {
    let number: String = whatsapp.chars().filter(char::is_ascii_digit).collect();
    if number.is_empty() {
        return None;
    }

    let subject = match record.package_type {
        PackageType::Excursion => "la excursión",
        PackageType::TravelPackage => "el paquete",
    };
    let text = format!(
        "Hola! Me interesa {subject} \"{}\". Me gustaría obtener más información.",
        record.name
    );

    let mut url = Url::parse("https://wa.me/").ok()?.join(&number).ok()?;
    url.query_pairs_mut().append_pair("text", &text);
    Some(url.into())
}

/// What a listing shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListingState {
    /// Fetch in flight
    Loading {
        /// Skeleton cards to draw
        placeholders: usize,
    },
    /// No rows of this type
    Empty {
        /// Explanation shown instead of the grid
        message: String,
    },
    /// Cards, newest first
    Populated {
        /// One card per row
        cards: Vec<PackageCard>,
    },
    /// The store could not be reached
    Failed {
        /// Page-level message
        message: String,
    },
}

/// Public listing for one package type.
#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    #[serde(rename = "type")]
    package_type: PackageType,
    #[serde(skip)]
    whatsapp: String,
    #[serde(flatten)]
    state: ListingState,
}

impl ListingView {
    /// A view in the loading state.
    #[must_use]
    pub fn new(package_type: PackageType, whatsapp: impl Into<String>) -> Self {
        Self {
            package_type,
            whatsapp: whatsapp.into(),
            state: ListingState::Loading {
                placeholders: PLACEHOLDER_CARDS,
            },
        }
    }

    /// Type this view lists.
    #[must_use]
    pub const fn package_type(&self) -> PackageType {
        self.package_type
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ListingState {
        &self.state
    }

    /// Cards when populated, otherwise empty.
    #[must_use]
    pub fn cards(&self) -> &[PackageCard] {
        match &self.state {
            ListingState::Populated { cards } => cards,
            _ => &[],
        }
    }

    /// Fetches the rows and settles the state. Failures are logged and shown, never retried.
    #[instrument(skip(self, store), fields(package_type = %self.package_type))]
    pub async fn load(&mut self, store: &dyn RecordStore) {
        self.state = match store.list(PackageFilter::of_type(self.package_type)).await {
            Ok(rows) if rows.is_empty() => ListingState::Empty {
                message: empty_message(self.package_type).to_string(),
            },
            Ok(rows) => ListingState::Populated {
                cards: rows
                    .iter()
                    .map(|row| PackageCard::new(row, &self.whatsapp))
                    .collect(),
            },
            Err(e) => {
                error!("Error fetching {} listing: {e}", self.package_type);
                ListingState::Failed {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                }
            }
        };
    }

    /// Falls back to the placeholder for one card whose image failed to load.
    ///
    /// Returns whether a card with that id exists.
    pub fn mark_image_failed(&mut self, id: Uuid) -> bool {
        let ListingState::Populated { cards } = &mut self.state else {
            return false;
        };
        match cards.iter_mut().find(|card| card.id == id) {
            Some(card) => {
                card.use_placeholder();
                true
            }
            None => false,
        }
    }
}

const fn empty_message(package_type: PackageType) -> &'static str {
    match package_type {
        PackageType::Excursion => "No hay excursiones disponibles en este momento.",
        PackageType::TravelPackage => "No hay paquetes de viaje disponibles en este momento.",
    }
}
