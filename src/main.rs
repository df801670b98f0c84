use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use turismo_diversidad::{
    auth::{AuthService, SupabaseAuth},
    config::{database, settings::Settings, site},
    core::seed::seed_packages,
    errors::Result,
    storage::{ImageStorage, SupabaseStorage},
    store::DatabaseStore,
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings
    let settings = Settings::from_env()
        .inspect_err(|e| error!("Critical error loading settings: {e}"))?;

    // 4. Connect to the record store and make sure the table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to record store: {e}"))?;
    database::create_tables(&db).await?;
    let store = Arc::new(DatabaseStore::new(db));

    // 5. Load site content; the site still serves listings without it
    let site_config = site::load_site_config(&settings.site_config_path).unwrap_or_else(|e| {
        warn!("Serving without site content: {e}");
        site::SiteConfig::default()
    });

    // 6. Seed initial packages into an empty store
    seed_packages(store.as_ref(), &site_config.packages)
        .await
        .inspect_err(|e| error!("Failed to seed initial packages: {e}"))?;

    // 7. Build collaborator clients
    let client = reqwest::Client::new();
    let supabase = &settings.supabase;
    let images = ImageStorage::new(
        Arc::new(SupabaseStorage::new(
            client.clone(),
            &supabase.url,
            &supabase.bucket,
            &supabase.anon_key,
            supabase.storage_key(),
        )),
        &supabase.bucket,
        &supabase.storage_host_marker,
    );
    let auth = AuthService::new(
        Arc::new(SupabaseAuth::new(client, &supabase.url, &supabase.anon_key)),
        settings.redirect_url(),
    );

    // 8. Run the server
    let state = AppState::new(store, images, auth, site_config);
    web::run_server(state, settings.port).await
}
