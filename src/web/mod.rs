//! Web layer - HTTP/JSON interface over the core
//!
//! This module exposes the public listings, the site content, authentication and
//! the admin panel as an axum router. Handlers stay thin: they extract input, call
//! into [`crate::core`] and serialize the result.

/// Route handlers grouped by area (public, auth, admin)
pub mod routes;
mod session;

pub use session::AdminSession;

use crate::{
    auth::AuthService,
    config::site::SiteConfig,
    errors::{Error, Result},
    storage::ImageStorage,
    store::RecordStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post, put},
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

/// Largest request body accepted by the admin upload routes.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state available to all handlers.
/// Holds the injected collaborators and the loaded site content.
#[derive(Clone)]
pub struct AppState {
    /// Travel package table
    pub store: Arc<dyn RecordStore>,
    /// Managed image bucket
    pub images: ImageStorage,
    /// Session and authentication
    pub auth: AuthService,
    /// Marketing content
    pub site: Arc<SiteConfig>,
    /// Packages with a save or delete in flight
    pub saves: InFlightSaves,
}

impl AppState {
    /// Bundles the collaborators for the router.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        images: ImageStorage,
        auth: AuthService,
        site: SiteConfig,
    ) -> Self {
        Self {
            store,
            images,
            auth,
            site: Arc::new(site),
            saves: InFlightSaves::default(),
        }
    }
}

/// Package ids currently being mutated by some request.
///
/// A second mutation of the same package fails with `Error::SubmissionInProgress`
/// until the first one finishes or is dropped.
#[derive(Debug, Clone, Default)]
pub struct InFlightSaves(Arc<Mutex<HashSet<Uuid>>>);

impl InFlightSaves {
    /// Marks `id` as busy for as long as the returned guard lives.
    ///
    /// # Errors
    /// Returns `Error::SubmissionInProgress` if `id` is already busy.
    pub fn begin(&self, id: Uuid) -> Result<InFlightSave> {
        let mut ids = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id) {
            return Err(Error::SubmissionInProgress);
        }
        Ok(InFlightSave {
            saves: self.clone(),
            id,
        })
    }

    /// Whether `id` is busy.
    #[must_use]
    pub fn is_busy(&self, id: Uuid) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// Releases its package id when dropped.
#[derive(Debug)]
pub struct InFlightSave {
    saves: InFlightSaves,
    id: Uuid,
}

impl Drop for InFlightSave {
    fn drop(&mut self) {
        self.saves
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let admin = Router::new()
        .route("/dashboard", get(routes::admin::dashboard))
        .route("/packages", post(routes::admin::create_package))
        .route(
            "/packages/{id}",
            put(routes::admin::update_package).delete(routes::admin::delete_package),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/health", get(routes::public::health))
        .route("/api/site", get(routes::public::site))
        .route("/api/packages", get(routes::public::list_packages))
        .route("/api/packages/{id}", get(routes::public::get_package))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/signup", post(routes::auth::sign_up))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/user", get(routes::auth::current_user))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serves the router on `0.0.0.0:<port>` until Ctrl+C or SIGTERM.
pub async fn run_server(state: AppState, port: u16) -> Result<()> {
    let app = router(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
