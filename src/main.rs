use std::sync::Arc;

use rekord_cms::config;
use rekord_cms::database::{DatabaseManager, PgStore};
use rekord_cms::editor::UploadPolicy;
use rekord_cms::settings::SettingsStore;
use rekord_cms::store::{BlobStore, DataStore, HttpBlobStore};
use rekord_cms::{app, is_production, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting RekordIT CMS API in {:?} mode", config.environment);

    if is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    let store: Arc<dyn DataStore> = Arc::new(PgStore::new(pool));
    let blobs: Arc<dyn BlobStore> = Arc::new(HttpBlobStore::from_config(&config.storage)?);

    let settings = Arc::new(SettingsStore::new(Arc::clone(&store)));
    match settings.refresh().await {
        Ok(flag) => tracing::info!("Recruitment is {}", if flag.is_open { "open" } else { "closed" }),
        Err(e) => tracing::warn!("Could not read recruitment status at startup: {}", e),
    }

    let state = AppState::new(store, blobs, settings, UploadPolicy::from_config(&config.storage));
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("RekordIT CMS API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
