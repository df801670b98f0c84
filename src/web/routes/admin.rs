//! Admin panel routes.
//!
//! Saves arrive as `multipart/form-data`: a `package` part holding the draft as
//! JSON, an optional `image` file part, and on edits an optional
//! `remove_image=true` part. An edit whose draft leaves out `image_url` keeps the
//! current image. Every route requires a bearer session.

use crate::{
    auth::User,
    core::{
        dashboard::{Dashboard, DashboardStats},
        form::{PackageDraft, PackageForm},
        package,
    },
    entities::TravelPackageModel,
    errors::{Error, Result},
    storage::ImageFile,
    web::{AdminSession, AppState},
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Dashboard payload.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Signed-in account
    pub user: User,
    /// Summary counters
    pub stats: DashboardStats,
    /// Every package, newest first
    pub packages: Vec<TravelPackageModel>,
}

/// Query string of the delete route.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// Must be `true` for the delete to run
    #[serde(default)]
    pub confirm: bool,
}

/// Parsed multipart save request.
#[derive(Debug, Default)]
struct PackageUpload {
    draft: Option<PackageDraft>,
    sends_image_url: bool,
    image: Option<ImageFile>,
    remove_image: bool,
}

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest {
        message: message.into(),
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<PackageUpload> {
    let mut upload = PackageUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "package" => {
                let text = field.text().await.map_err(|e| bad_request(e.body_text()))?;
                let invalid = |e: serde_json::Error| {
                    bad_request(format!("Datos del paquete inválidos: {e}"))
                };
                let value = serde_json::from_str::<serde_json::Value>(&text).map_err(invalid)?;
                upload.sends_image_url = value.get("image_url").is_some();
                upload.draft = Some(serde_json::from_value(value).map_err(invalid)?);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
                // Browsers send an empty part when no file was picked
                if !(file_name.is_empty() && bytes.is_empty()) {
                    upload.image = Some(ImageFile::new(file_name, content_type, bytes.to_vec()));
                }
            }
            "remove_image" => {
                let text = field.text().await.map_err(|e| bad_request(e.body_text()))?;
                upload.remove_image = text.trim() == "true";
            }
            _ => {}
        }
    }

    Ok(upload)
}

async fn save(
    state: &AppState,
    mut form: PackageForm,
    upload: PackageUpload,
) -> Result<TravelPackageModel> {
    let draft = upload
        .draft
        .ok_or_else(|| bad_request("Falta la parte `package`"))?;
    let current_url = form.draft().image_url.clone();
    form.set_draft(draft);
    if !upload.sends_image_url {
        form.draft_mut().image_url = current_url;
    }

    if upload.remove_image {
        form.remove_image();
    }
    if let Some(image) = upload.image {
        form.select_image(image, &state.images)?;
    }

    let saved = form.submit(state.store.as_ref(), &state.images).await?;
    Ok(saved.into_record())
}

/// User, counters and the full package list.
pub async fn dashboard(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<DashboardResponse>> {
    let dashboard = Dashboard::for_user(session.user, state.store.as_ref()).await?;

    Ok(Json(DashboardResponse {
        user: dashboard.user().clone(),
        stats: dashboard.stats(),
        packages: dashboard.packages().to_vec(),
    }))
}

/// Creates a package.
pub async fn create_package(
    State(state): State<AppState>,
    session: AdminSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<TravelPackageModel>)> {
    let upload = read_upload(multipart).await?;
    let created = save(&state, PackageForm::create(), upload).await?;

    info!("User {} created package {}", session.user.id, created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// Updates package `id`.
pub async fn update_package(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<TravelPackageModel>> {
    let _saving = state.saves.begin(id)?;
    let existing = package::get_package(state.store.as_ref(), id).await?;
    let upload = read_upload(multipart).await?;
    let updated = save(&state, PackageForm::edit(&existing), upload).await?;

    info!("User {} updated package {id}", session.user.id);
    Ok(Json(updated))
}

/// Deletes package `id`; requires `?confirm=true`.
pub async fn delete_package(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    if !query.confirm {
        return Err(Error::ConfirmationRequired);
    }

    let _deleting = state.saves.begin(id)?;
    let existing = package::get_package(state.store.as_ref(), id).await?;
    package::delete_package(state.store.as_ref(), &state.images, &existing).await?;

    info!("User {} deleted package {id}", session.user.id);
    Ok(StatusCode::NO_CONTENT)
}
