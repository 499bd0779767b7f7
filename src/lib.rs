pub mod appresult;
pub mod auth;
pub mod config;
pub mod db;
pub mod index;
pub mod moderation;
pub mod profiles;
pub mod res;
pub mod session;
pub mod uploads;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::Method,
    routing::get,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

pub use appresult::{AppError, AppResult};
use config::Config;
use uploads::PhotoStore;

/// Room for the text fields next to a maximum-size photo.
const FORM_OVERHEAD_BYTES: usize = 256 * 1024;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
    pub photos: PhotoStore,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        let photos = PhotoStore::new(&config.upload_dir, config.max_upload_bytes);
        Self {
            db_pool,
            config: Arc::new(config),
            photos,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.session_minutes,
        )));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any)
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .merge(profiles::router())
        .nest("/admin", auth::router().merge(moderation::router()));

    Router::new()
        .route("/", get(index::index))
        .merge(profiles::pages())
        .nest("/api", api)
        .nest_service(uploads::PUBLIC_PREFIX, ServeDir::new(state.photos.dir()))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .with_state(state)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
