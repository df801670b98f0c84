//! Shared test utilities for `turismo-diversidad`.
//!
//! This module provides the in-memory collaborators (store wrapper, object storage,
//! auth) the core is tested against, plus helpers for building sample records and
//! image fixtures with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    auth::{AuthProvider, AuthService, Credentials, Session, User},
    config::site::{Contact, SiteConfig},
    core::form::PackageDraft,
    entities::{PackageType, TravelPackageModel},
    errors::{Error, Result},
    storage::{ImageFile, ImageStorage, ObjectStorage},
    store::{DatabaseStore, PackageChanges, PackageData, PackageFilter, RecordStore},
    web::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use sea_orm::{DatabaseConnection, DbErr};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io::Cursor,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tower::ServiceExt;
use uuid::Uuid;

/// Bucket name used by every test `ImageStorage`.
pub const TEST_BUCKET: &str = "package-images";
/// Host marker used by every test `ImageStorage`.
pub const TEST_HOST_MARKER: &str = "supabase.co/storage";
/// Public URL prefix of objects in [`MemoryObjectStorage`].
pub const MANAGED_URL_PREFIX: &str =
    "https://test-project.supabase.co/storage/v1/object/public/package-images/";

/// Account known to [`FakeAuth`] in [`fake_auth_service`].
pub const FAKE_ADMIN_EMAIL: &str = "admin@turismo.com";
/// Password of [`FAKE_ADMIN_EMAIL`].
pub const FAKE_ADMIN_PASSWORD: &str = "secreto";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A [`DatabaseStore`] over a fresh in-memory database.
pub async fn setup_test_store() -> Result<DatabaseStore> {
    Ok(DatabaseStore::new(setup_test_db().await?))
}

/// Sets up a recording store, an image service and the bucket behind it.
/// Returns (store, images, bucket) for form and dashboard tests.
pub async fn setup_services()
-> Result<(RecordingStore, ImageStorage, Arc<MemoryObjectStorage>)> {
    let store = RecordingStore::new(setup_test_store().await?);
    let bucket = Arc::new(MemoryObjectStorage::default());
    let images = ImageStorage::new(
        Arc::clone(&bucket) as Arc<dyn ObjectStorage>,
        TEST_BUCKET,
        TEST_HOST_MARKER,
    );
    Ok((store, images, bucket))
}

/// Insert payload with sensible defaults.
///
/// # Defaults
/// * type: excursion, 1 day, 0 nights
/// * services: `["Guía", "Transporte"]`
/// * transportation: "Lancha"
/// * no image, no price
pub fn sample_data(name: &str) -> PackageData {
    PackageData {
        name: name.to_string(),
        destination: "Esteros del Iberá".to_string(),
        description: format!("{name} por los esteros."),
        duration_days: 1,
        duration_nights: 0,
        services: vec!["Guía".to_string(), "Transporte".to_string()],
        transportation: "Lancha".to_string(),
        package_type: PackageType::Excursion,
        image_url: None,
        price: None,
    }
}

/// Valid draft matching [`sample_data`].
pub fn sample_draft(name: &str) -> PackageDraft {
    let data = sample_data(name);
    PackageDraft {
        name: data.name,
        destination: data.destination,
        description: data.description,
        duration_days: data.duration_days,
        duration_nights: data.duration_nights,
        services: data.services,
        transportation: data.transportation,
        package_type: data.package_type.as_str().to_string(),
        image_url: None,
        price: None,
    }
}

/// A record built in memory, never stored.
pub fn sample_record(name: &str) -> TravelPackageModel {
    let data = sample_data(name);
    let now = chrono::Utc::now();
    TravelPackageModel {
        id: Uuid::new_v4(),
        name: data.name,
        destination: data.destination,
        description: data.description,
        duration_days: data.duration_days,
        duration_nights: data.duration_nights,
        services: data.services.into(),
        transportation: data.transportation,
        package_type: data.package_type,
        image_url: None,
        price: None,
        created_at: now,
        updated_at: now,
    }
}

/// Short sleep so consecutive inserts get distinct timestamps.
pub async fn pause() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}

/// A real PNG of the given size.
pub fn png_file(name: &str, width: u32, height: u32) -> ImageFile {
    #[allow(clippy::cast_possible_truncation)]
    let pixels = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });

    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    ImageFile::new(name, "image/png", buffer.into_inner())
}

fn injected_failure(what: &str) -> Error {
    Error::Database(DbErr::Custom(format!("injected {what} failure")))
}

/// Store operations, as recorded by [`RecordingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `list`
    List,
    /// `get_by_id`
    Get,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

/// Wraps a real store, logging every call and failing selected operations on demand.
pub struct RecordingStore {
    inner: DatabaseStore,
    calls: Mutex<Vec<StoreOp>>,
    failing: Mutex<HashSet<StoreOp>>,
    stalled: Mutex<HashSet<StoreOp>>,
    inserts: Mutex<Vec<PackageData>>,
}

impl RecordingStore {
    /// Wraps `inner`.
    pub fn new(inner: DatabaseStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            stalled: Mutex::new(HashSet::new()),
            inserts: Mutex::new(Vec::new()),
        }
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<StoreOp> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `op` was called.
    pub fn count(&self, op: StoreOp) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    /// Payload of the last `create` call.
    pub fn last_insert(&self) -> Option<PackageData> {
        self.inserts.lock().unwrap().last().cloned()
    }

    /// Makes every later `op` call fail.
    pub fn fail_on(&self, op: StoreOp) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Stops injecting failures.
    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Makes every later `op` call hang until its future is dropped.
    pub fn stall_on(&self, op: StoreOp) {
        self.stalled.lock().unwrap().insert(op);
    }

    /// Stops stalling calls.
    pub fn clear_stalls(&self) {
        self.stalled.lock().unwrap().clear();
    }

    async fn record(&self, op: StoreOp) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(injected_failure("store"));
        }
        let stalled = self.stalled.lock().unwrap().contains(&op);
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn list(&self, filter: PackageFilter) -> Result<Vec<TravelPackageModel>> {
        self.record(StoreOp::List).await?;
        self.inner.list(filter).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TravelPackageModel>> {
        self.record(StoreOp::Get).await?;
        self.inner.get_by_id(id).await
    }

    async fn create(&self, data: PackageData) -> Result<TravelPackageModel> {
        self.inserts.lock().unwrap().push(data.clone());
        self.record(StoreOp::Create).await?;
        self.inner.create(data).await
    }

    async fn update(&self, id: Uuid, changes: PackageChanges) -> Result<TravelPackageModel> {
        self.record(StoreOp::Update).await?;
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.record(StoreOp::Delete).await?;
        self.inner.delete(id).await
    }
}

/// Bucket kept in memory. Removal attempts are recorded even when they fail.
#[derive(Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<BTreeMap<String, ImageFile>>,
    removed: Mutex<Vec<String>>,
    fail_removals: Mutex<bool>,
}

impl MemoryObjectStorage {
    /// Whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    /// Paths of every stored object, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Every path a removal was attempted for, in order.
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    /// Makes every later removal fail.
    pub fn fail_removals(&self) {
        *self.fail_removals.lock().unwrap() = true;
    }

    /// Stores a small placeholder object directly and returns its path.
    pub fn insert_object(&self, path: &str) -> String {
        self.objects.lock().unwrap().insert(
            path.to_string(),
            ImageFile::new(path, "image/webp", vec![0; 16]),
        );
        path.to_string()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put_object(&self, path: &str, file: &ImageFile) -> Result<String> {
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(path) {
            return Err(Error::Storage {
                message: "The resource already exists".to_string(),
            });
        }
        objects.insert(path.to_string(), file.clone());
        Ok(path.to_string())
    }

    async fn remove_objects(&self, paths: &[String]) -> Result<()> {
        self.removed.lock().unwrap().extend(paths.iter().cloned());
        if *self.fail_removals.lock().unwrap() {
            return Err(Error::Storage {
                message: "injected removal failure".to_string(),
            });
        }

        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{MANAGED_URL_PREFIX}{path}")
    }
}

/// Auth service with a fixed set of accounts and in-memory sessions.
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, String>>,
    sessions: Mutex<HashMap<String, User>>,
    calls: AtomicUsize,
    last_redirect: Mutex<Option<String>>,
}

impl FakeAuth {
    /// A provider knowing one account.
    pub fn with_user(email: &str, password: &str) -> Self {
        let fake = Self::default();
        fake.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        fake
    }

    /// Number of calls that reached the provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Redirect URL passed to the last sign-up.
    pub fn last_redirect(&self) -> Option<String> {
        self.last_redirect.lock().unwrap().clone()
    }

    fn user_for(email: &str) -> User {
        User {
            id: format!("user-{email}"),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let known = self.accounts.lock().unwrap().get(&credentials.email).cloned();
        if known.as_deref() != Some(credentials.password.as_str()) {
            return Err(Error::Auth {
                message: "Invalid login credentials".to_string(),
            });
        }

        let user = Self::user_for(&credentials.email);
        let access_token = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(access_token.clone(), user.clone());
        Ok(Session {
            access_token,
            refresh_token: None,
            expires_in: Some(3600),
            user,
        })
    }

    async fn sign_up(&self, credentials: &Credentials, redirect_to: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&credentials.email) {
            return Err(Error::Auth {
                message: "User already registered".to_string(),
            });
        }
        accounts.insert(credentials.email.clone(), credentials.password.clone());
        *self.last_redirect.lock().unwrap() = Some(redirect_to.to_string());
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().unwrap().remove(access_token);
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<User>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sessions.lock().unwrap().get(access_token).cloned())
    }
}

/// Auth service over a [`FakeAuth`] that knows [`FAKE_ADMIN_EMAIL`].
pub fn fake_auth_service() -> AuthService {
    fake_auth_service_with(Arc::new(FakeAuth::with_user(
        FAKE_ADMIN_EMAIL,
        FAKE_ADMIN_PASSWORD,
    )))
}

/// Auth service over the given provider, redirecting to the local admin page.
pub fn fake_auth_service_with(provider: Arc<FakeAuth>) -> AuthService {
    AuthService::new(provider as Arc<dyn AuthProvider>, "http://localhost:3000/admin")
}

/// The user [`FakeAuth`] reports for [`FAKE_ADMIN_EMAIL`].
pub fn fake_user() -> User {
    FakeAuth::user_for(FAKE_ADMIN_EMAIL)
}

/// WhatsApp number in the test site config.
pub const TEST_WHATSAPP: &str = "5437864089559";

/// Router plus handles on its in-memory collaborators.
pub struct TestApp {
    /// Router under test
    pub router: axum::Router,
    /// The state the router was built with
    pub state: AppState,
    /// Store behind the router
    pub store: Arc<RecordingStore>,
    /// Bucket behind the router
    pub bucket: Arc<MemoryObjectStorage>,
    /// Auth provider behind the router
    pub auth: Arc<FakeAuth>,
}

/// Builds the full router over in-memory collaborators.
pub async fn setup_app() -> Result<TestApp> {
    let store = Arc::new(RecordingStore::new(setup_test_store().await?));
    let bucket = Arc::new(MemoryObjectStorage::default());
    let images = ImageStorage::new(
        Arc::clone(&bucket) as Arc<dyn ObjectStorage>,
        TEST_BUCKET,
        TEST_HOST_MARKER,
    );
    let site = SiteConfig {
        brand: "Turismo Diversidad".to_string(),
        contact: Contact {
            whatsapp: TEST_WHATSAPP.to_string(),
            ..Contact::default()
        },
        ..SiteConfig::default()
    };

    let auth = Arc::new(FakeAuth::with_user(FAKE_ADMIN_EMAIL, FAKE_ADMIN_PASSWORD));
    let state = AppState::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        images,
        fake_auth_service_with(Arc::clone(&auth)),
        site,
    );

    Ok(TestApp {
        router: crate::web::router(state.clone()),
        state,
        store,
        bucket,
        auth,
    })
}

impl TestApp {
    /// Signs in as [`FAKE_ADMIN_EMAIL`] and returns the bearer token.
    pub async fn login(&self) -> Result<String> {
        let session = self
            .state
            .auth
            .sign_in(FAKE_ADMIN_EMAIL, FAKE_ADMIN_PASSWORD)
            .await?;
        Ok(session.access_token)
    }

    /// Sends a request and returns the status and raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// `GET` returning the raw body.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, String) {
        let request = request_builder(Method::GET, uri, token)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// `GET` returning the body as JSON (`Null` when empty or not JSON).
    pub async fn get_json(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let (status, body) = self.get(uri, token).await;
        (status, parse_json(&body))
    }

    /// Sends a JSON body.
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> (StatusCode, Value) {
        let request = request_builder(method, uri, token)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, parse_json(&body))
    }

    /// Sends a `multipart/form-data` body.
    pub async fn send_multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: MultipartBody,
    ) -> (StatusCode, Value) {
        let request = request_builder(method, uri, token)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body.finish()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, parse_json(&body))
    }
}

fn request_builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

fn parse_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or(Value::Null)
}

const MULTIPART_BOUNDARY: &str = "turismo-test-boundary";

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    /// An empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain text part.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n"));
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// Adds a part holding `value` serialized as JSON.
    pub fn json(self, name: &str, value: &Value) -> Self {
        self.text(name, &value.to_string())
    }

    /// Adds a file part.
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, contents: &[u8]) -> Self {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n"
        ));
        self.bytes.extend_from_slice(contents);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn open_part(&mut self, headers: &str) {
        self.bytes
            .extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n{headers}\r\n").as_bytes());
    }

    /// Closes the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}
