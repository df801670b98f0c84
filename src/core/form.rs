//! Package form - draft editing, validation and the create/update submit protocol.
//!
//! A [`PackageForm`] is opened either empty (create mode) or pre-filled from an
//! existing record (edit mode) and only changes mode when it is reopened. All
//! validation happens locally and synchronously before any network call; an invalid
//! draft never reaches the store. Image handling follows one rule: a managed image
//! that is replaced or removed gets deleted, but failing to delete it never fails
//! the save.

use crate::{
    entities::{PackageType, TravelPackageModel},
    errors::{Error, Result},
    storage::{ImageFile, ImageStorage, UploadedImage},
    store::{PackageData, RecordStore},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::{error, instrument, warn};
use uuid::Uuid;

const SUBMIT_FAILED_MESSAGE: &str = "Error al guardar el paquete. Inténtalo de nuevo.";
const OPTIMIZE_FAILED_MESSAGE: &str = "No se pudo optimizar la imagen";

/// In-progress record data, as typed by the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDraft {
    /// Display name
    pub name: String,
    /// Destination
    pub destination: String,
    /// Description
    pub description: String,
    /// Days
    pub duration_days: i32,
    /// Nights
    pub duration_nights: i32,
    /// Included services
    pub services: Vec<String>,
    /// Transportation
    pub transportation: String,
    /// Raw type value, parsed on validation
    #[serde(rename = "type")]
    pub package_type: String,
    /// Image URL typed by hand; empty means no image
    pub image_url: Option<String>,
    /// Optional price
    pub price: Option<f64>,
}

impl Default for PackageDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            destination: String::new(),
            description: String::new(),
            duration_days: 1,
            duration_nights: 0,
            services: Vec::new(),
            transportation: String::new(),
            package_type: PackageType::TravelPackage.as_str().to_string(),
            image_url: None,
            price: None,
        }
    }
}

impl From<&TravelPackageModel> for PackageDraft {
    fn from(record: &TravelPackageModel) -> Self {
        Self {
            name: record.name.clone(),
            destination: record.destination.clone(),
            description: record.description.clone(),
            duration_days: record.duration_days,
            duration_nights: record.duration_nights,
            services: record.services.to_vec(),
            transportation: record.transportation.clone(),
            package_type: record.package_type.as_str().to_string(),
            image_url: record.image_url.clone(),
            price: record.price,
        }
    }
}

/// A draft field that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    /// `name`
    Name,
    /// `destination`
    Destination,
    /// `description`
    Description,
    /// `type`
    #[serde(rename = "type")]
    Type,
    /// `duration_days`
    DurationDays,
    /// `duration_nights`
    DurationNights,
    /// `transportation`
    Transportation,
    /// `services`
    Services,
    /// `price`
    Price,
}

/// Field-level validation messages, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    fn add(&mut self, field: FormField, message: &str) {
        self.0.entry(field).or_insert_with(|| message.to_string());
    }

    /// Whether no rule failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if its rule failed.
    #[must_use]
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Fields whose rules failed, in form order.
    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Checks every rule on a draft and returns the cleaned insert payload.
///
/// All failing rules are reported together.
///
/// # Errors
/// Returns the collected field messages when any rule fails.
pub fn validate_draft(draft: &PackageDraft) -> std::result::Result<PackageData, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = draft.name.trim();
    let destination = draft.destination.trim();
    let description = draft.description.trim();
    let transportation = draft.transportation.trim();

    if name.is_empty() {
        errors.add(FormField::Name, "El nombre es requerido");
    }
    if destination.is_empty() {
        errors.add(FormField::Destination, "El destino es requerido");
    }
    if description.is_empty() {
        errors.add(FormField::Description, "La descripción es requerida");
    }
    let package_type = draft.package_type.parse::<PackageType>().ok();
    if package_type.is_none() {
        errors.add(FormField::Type, "El tipo es requerido");
    }
    if draft.duration_days < 1 {
        errors.add(FormField::DurationDays, "La duración debe ser al menos 1 día");
    }
    if draft.duration_nights < 0 {
        errors.add(FormField::DurationNights, "Las noches no pueden ser negativas");
    }
    if transportation.is_empty() {
        errors.add(
            FormField::Transportation,
            "El medio de transporte es requerido",
        );
    }
    if draft.services.is_empty() {
        errors.add(FormField::Services, "Debe agregar al menos un servicio");
    }
    if let Some(price) = draft.price {
        if !price.is_finite() || price <= 0.0 {
            errors.add(FormField::Price, "El precio debe ser un número positivo");
        }
    }

    match package_type {
        Some(package_type) if errors.is_empty() => Ok(PackageData {
            name: name.to_string(),
            destination: destination.to_string(),
            description: description.to_string(),
            duration_days: draft.duration_days,
            duration_nights: draft.duration_nights,
            services: draft.services.clone(),
            transportation: transportation.to_string(),
            package_type,
            image_url: draft
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            price: draft.price,
        }),
        _ => Err(errors),
    }
}

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    /// Empty draft, inserts on submit
    Create,
    /// Draft copied from this record, updates it on submit
    Edit(Box<TravelPackageModel>),
}

/// What happens to the record's image on submit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSelection {
    /// Keep whatever `image_url` the draft holds
    #[default]
    Unchanged,
    /// Optimize and upload this file
    Selected(ImageFile),
    /// Drop the current image
    Removed,
}

/// What the image area of the form shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImagePreview {
    /// No image
    None,
    /// An image that is already hosted somewhere
    Remote {
        /// Hosted URL
        url: String,
    },
    /// A selected file not uploaded yet
    Pending {
        /// Selected file name
        file_name: String,
        /// Selected file size in bytes
        size: usize,
    },
}

/// A record saved by a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SavedPackage {
    /// The form was in create mode
    Created(TravelPackageModel),
    /// The form was in edit mode
    Updated(TravelPackageModel),
}

impl SavedPackage {
    /// The saved record.
    #[must_use]
    pub const fn record(&self) -> &TravelPackageModel {
        match self {
            Self::Created(record) | Self::Updated(record) => record,
        }
    }

    /// Takes the saved record.
    #[must_use]
    pub fn into_record(self) -> TravelPackageModel {
        match self {
            Self::Created(record) | Self::Updated(record) => record,
        }
    }
}

/// Admin dialog state for creating or editing one travel package.
#[derive(Debug, Clone)]
pub struct PackageForm {
    mode: FormMode,
    draft: PackageDraft,
    image: ImageSelection,
    field_errors: ValidationErrors,
    image_error: Option<String>,
    submit_error: Option<String>,
    submitting: bool,
    open: bool,
}

impl PackageForm {
    /// Opens an empty form in create mode.
    #[must_use]
    pub fn create() -> Self {
        Self::opened(FormMode::Create, PackageDraft::default())
    }

    /// Opens a form in edit mode, pre-filled from `record`.
    #[must_use]
    pub fn edit(record: &TravelPackageModel) -> Self {
        Self::opened(
            FormMode::Edit(Box::new(record.clone())),
            PackageDraft::from(record),
        )
    }

    fn opened(mode: FormMode, draft: PackageDraft) -> Self {
        Self {
            mode,
            draft,
            image: ImageSelection::Unchanged,
            field_errors: ValidationErrors::default(),
            image_error: None,
            submit_error: None,
            submitting: false,
            open: true,
        }
    }

    /// Reopens the dialog for `target`, or empty when `None`, discarding the current draft.
    pub fn reopen(&mut self, target: Option<&TravelPackageModel>) {
        *self = target.map_or_else(Self::create, Self::edit);
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Whether the form edits an existing record.
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    /// Whether the dialog is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a submit is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Closes the dialog without saving.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Current draft.
    #[must_use]
    pub const fn draft(&self) -> &PackageDraft {
        &self.draft
    }

    /// Mutable access to the draft for plain field edits.
    pub fn draft_mut(&mut self) -> &mut PackageDraft {
        &mut self.draft
    }

    /// Replaces the draft wholesale; services go through [`Self::add_service`].
    pub fn set_draft(&mut self, draft: PackageDraft) {
        let services = draft.services.clone();
        self.draft = PackageDraft {
            services: Vec::new(),
            ..draft
        };
        for service in &services {
            self.add_service(service);
        }
    }

    /// Field messages from the last submit attempt.
    #[must_use]
    pub const fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    /// Banner message from the last failed submit.
    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Message from the last rejected image selection.
    #[must_use]
    pub fn image_error(&self) -> Option<&str> {
        self.image_error.as_deref()
    }

    /// Appends a service tag after trimming; blanks and exact duplicates are ignored.
    ///
    /// Returns whether the list changed.
    pub fn add_service(&mut self, raw: &str) -> bool {
        let service = raw.trim();
        if service.is_empty() || self.draft.services.iter().any(|s| s == service) {
            return false;
        }
        self.draft.services.push(service.to_string());
        true
    }

    /// Removes the service tag equal to `service`.
    pub fn remove_service(&mut self, service: &str) {
        self.draft.services.retain(|s| s != service);
    }

    /// Attaches a file to upload on submit.
    ///
    /// # Errors
    /// Returns `Error::InvalidImage` (and keeps the previous selection) if the file is not an image.
    pub fn select_image(&mut self, file: ImageFile, images: &ImageStorage) -> Result<()> {
        if let Err(e) = images.validate(&file) {
            if let Error::InvalidImage { reason } = &e {
                self.image_error = Some(reason.clone());
            }
            return Err(e);
        }

        self.image_error = None;
        self.image = ImageSelection::Selected(file);
        Ok(())
    }

    /// Drops both a pending file and the current image URL.
    pub fn remove_image(&mut self) {
        self.image = ImageSelection::Removed;
        self.draft.image_url = None;
    }

    /// Current image selection.
    #[must_use]
    pub const fn image_selection(&self) -> &ImageSelection {
        &self.image
    }

    /// What the image area shows right now.
    #[must_use]
    pub fn preview(&self) -> ImagePreview {
        match &self.image {
            ImageSelection::Selected(file) => ImagePreview::Pending {
                file_name: file.file_name.clone(),
                size: file.len(),
            },
            ImageSelection::Removed => ImagePreview::None,
            ImageSelection::Unchanged => self
                .draft
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map_or(ImagePreview::None, |url| ImagePreview::Remote {
                    url: url.to_string(),
                }),
        }
    }

    /// Validates the draft, recording field messages on the form.
    ///
    /// # Errors
    /// Returns `Error::Validation` with every failing field.
    pub fn validate(&mut self) -> Result<PackageData> {
        match validate_draft(&self.draft) {
            Ok(data) => {
                self.field_errors = ValidationErrors::default();
                Ok(data)
            }
            Err(errors) => {
                self.field_errors = errors.clone();
                Err(Error::Validation(errors))
            }
        }
    }

    /// Validates and saves the draft.
    ///
    /// On success the form closes and the saved record is returned for the caller to
    /// apply locally. On failure the form stays open with its draft intact and a
    /// banner message, so the user can retry.
    ///
    /// # Errors
    /// - `Error::Validation` before any network call when the draft is invalid
    /// - `Error::SubmissionInProgress` when the form is still marked as submitting
    /// - any optimization, upload or store failure
    #[instrument(skip_all, fields(edit = self.is_edit()))]
    pub async fn submit(
        &mut self,
        store: &dyn RecordStore,
        images: &ImageStorage,
    ) -> Result<SavedPackage> {
        if self.submitting {
            return Err(Error::SubmissionInProgress);
        }

        let data = self.validate()?;

        self.submit_error = None;
        let result = {
            let _submitting = SubmittingFlag::raise(&mut self.submitting);
            persist(&self.mode, &self.image, data, store, images).await
        };

        match result {
            Ok(saved) => {
                self.open = false;
                Ok(saved)
            }
            Err(e) => {
                error!("Error saving package: {e}");
                self.submit_error = Some(submit_message(&e));
                Err(e)
            }
        }
    }
}

/// Holds a form's `submitting` flag up; dropping it, even mid-await, lowers it.
struct SubmittingFlag<'a>(&'a mut bool);

impl<'a> SubmittingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for SubmittingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

async fn persist(
    mode: &FormMode,
    image: &ImageSelection,
    mut data: PackageData,
    store: &dyn RecordStore,
    images: &ImageStorage,
) -> Result<SavedPackage> {
    let previous_url = match mode {
        FormMode::Edit(record) => record.image_url.clone(),
        FormMode::Create => None,
    };

    let mut uploaded: Option<UploadedImage> = None;
    match image {
        ImageSelection::Selected(file) => {
            // Create mode has no record id yet, so the object gets a fresh owner id
            let owner_id = match mode {
                FormMode::Edit(record) => record.id,
                FormMode::Create => Uuid::new_v4(),
            };
            let optimized = images.optimize(file.clone()).await?;
            let upload = images.upload(&optimized, &owner_id.to_string()).await?;
            data.image_url = Some(upload.url.clone());
            uploaded = Some(upload);
        }
        ImageSelection::Removed => data.image_url = None,
        ImageSelection::Unchanged => {}
    }

    let saved = match mode {
        FormMode::Create => store.create(data).await.map(SavedPackage::Created),
        FormMode::Edit(record) => store
            .update(record.id, data.into())
            .await
            .map(SavedPackage::Updated),
    };

    match saved {
        Ok(saved) => {
            if let Some(old_url) = previous_url {
                if saved.record().image_url.as_deref() != Some(old_url.as_str()) {
                    images.delete_best_effort(&old_url).await;
                }
            }
            Ok(saved)
        }
        Err(e) => {
            if let Some(upload) = uploaded {
                if let Err(cleanup) = images.delete_by_path(&upload.path).await {
                    warn!("Failed to remove orphaned upload {}: {cleanup}", upload.path);
                }
            }
            Err(e)
        }
    }
}

fn submit_message(error: &Error) -> String {
    match error {
        Error::ImageOptimization { .. } => OPTIMIZE_FAILED_MESSAGE.to_string(),
        Error::Storage { message } => message.clone(),
        _ => SUBMIT_FAILED_MESSAGE.to_string(),
    }
}
