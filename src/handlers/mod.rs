// handlers/mod.rs - two-tier handler layout
//
// Public (no auth): service info, health, published content, recruitment flag
// Admin (JWT with role claim): sections, uploads, settings, team roster
pub mod admin;
pub mod public;
pub mod team;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, patch, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{Session, TokenSession};
use crate::config;
use crate::editor::UploadPolicy;
use crate::error::ApiError;
use crate::middleware::jwt_auth_middleware;
use crate::settings::SettingsStore;
use crate::shell::AdminShell;
use crate::store::{BlobStore, DataStore};

/// Shared handles every handler needs
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub settings: Arc<SettingsStore>,
    pub upload: UploadPolicy,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        blobs: Arc<dyn BlobStore>,
        settings: Arc<SettingsStore>,
        upload: UploadPolicy,
    ) -> Self {
        Self { store, blobs, settings, upload }
    }

    /// Admin shell for the session the auth middleware attached
    pub fn shell(&self, session: Session) -> Result<AdminShell, ApiError> {
        let auth = TokenSession::from_session(session);
        Ok(AdminShell::open(&auth, Arc::clone(&self.store), Arc::clone(&self.settings))?)
    }
}

pub fn app(state: AppState) -> Router {
    // Leave room above the upload limit so oversized images get a JSON error
    let body_limit = state.upload.max_bytes.saturating_mul(2);

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Admin panel
        .merge(admin_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer());

    if config::config().api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/content/:collection", get(public::content_get))
        .route("/api/settings/recruitment", get(public::recruitment_get))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/tabs", get(admin::tabs_get))
        .route(
            "/api/admin/sections/:collection",
            get(admin::section_get).post(admin::section_post),
        )
        .route("/api/admin/sections/:collection/:id", delete(admin::section_delete))
        .route("/api/admin/uploads/:filename", post(admin::upload_post))
        .route("/api/admin/settings/recruitment", put(admin::recruitment_put))
        .route("/api/admin/team", get(team::team_get).post(team::team_post))
        .route("/api/admin/team/:id", patch(team::member_patch).delete(team::member_delete))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "RekordIT CMS API",
            "version": version,
            "description": "Content and admin panel API for the RekordIT recruitment site",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "content": "/api/content/:collection[?category=] (public)",
                "recruitment": "/api/settings/recruitment (public)",
                "tabs": "/api/admin/tabs (protected)",
                "sections": "/api/admin/sections/:collection[/:id] (protected)",
                "uploads": "/api/admin/uploads/:filename (protected)",
                "settings": "/api/admin/settings/recruitment (protected)",
                "team": "/api/admin/team[/:id] (protected, admin role)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
